//! The assignment detail page and its "take assignment" submission form.

use friendassign_api::assignment::{Assignment, AssignmentId};
use friendassign_api::client::Client;
use friendassign_api::services::api_service::ApiService;
use friendassign_api::session::Session;
use friendassign_api::submission::SubmissionDraft;
use friendassign_api::types::Identity;
use tracing::{info, warn};

use crate::notice::{Notice, Outcome, Route};
use crate::validation::{Field, FieldError, is_web_url};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load assignment details. Please try again.";
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit assignment. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionForm {
    pub link: String,
    pub notes: String,
}

impl SubmissionForm {
    fn draft(&self, identity: &Identity) -> Result<SubmissionDraft, Vec<FieldError>> {
        let link = self.link.trim();
        if link.is_empty() {
            return Err(vec![FieldError::new(Field::Link, "A link to your work is required.")]);
        }
        if !is_web_url(link) {
            return Err(vec![FieldError::new(Field::Link, "The link must be a valid URL.")]);
        }

        Ok(SubmissionDraft {
            google_docs_link: link.to_owned(),
            notes: self.notes.trim().to_owned(),
            user_email: identity.email().clone(),
            user_name: identity.display_name().clone(),
        })
    }
}

#[derive(Debug)]
pub struct AssignmentDetail<Service> {
    client: Client<Service>,
    assignment: Assignment,
    form: Option<SubmissionForm>,
    submitting: bool,
}

impl<Service: ApiService> AssignmentDetail<Service> {
    /// Loads the assignment, or says what to show and sends the user back to the list.
    pub async fn load(client: Client<Service>, id: &AssignmentId) -> Result<Self, Outcome> {
        match client.get_assignment(id).await {
            Ok(assignment) => Ok(Self {
                client,
                assignment,
                form: None,
                submitting: false,
            }),
            Err(err) => {
                warn!(%id, "could not load assignment: {err:#}");
                Err(Outcome::show(Notice::error(LOAD_FAILED_MESSAGE)).and_navigate(Route::Assignments))
            }
        }
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn form(&self) -> Option<&SubmissionForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut SubmissionForm> {
        self.form.as_mut()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn open_submission_form(&mut self, session: &Session) -> Outcome {
        if !session.is_authenticated() {
            return Outcome::show(Notice::login_required(
                "Login Required",
                "Please log in to submit an assignment.",
            ))
            .and_navigate(Route::Login);
        }
        self.form.get_or_insert_with(SubmissionForm::default);
        Outcome::nothing()
    }

    pub fn close_submission_form(&mut self) {
        self.form = None;
    }

    /// Sends the open form. On failure the form stays open with what the user typed.
    pub async fn submit(&mut self, session: &Session) -> Outcome {
        let Some(identity) = session.identity() else {
            return Outcome::show(Notice::login_required(
                "Error",
                "You must be logged in to submit an assignment.",
            ))
            .and_navigate(Route::Login);
        };
        if self.submitting {
            return Outcome::nothing();
        }
        let Some(form) = &self.form else {
            return Outcome::nothing();
        };

        let draft = match form.draft(&identity) {
            Ok(draft) => draft,
            Err(errors) => {
                return Outcome::show(Notice::validation(
                    "Please fix the errors in the form.",
                    errors,
                ));
            }
        };

        self.submitting = true;
        let result = self
            .client
            .submit_assignment(self.assignment.id(), &draft)
            .await;
        self.submitting = false;

        match result {
            Ok(submission) => {
                let id = submission.as_ref().map(|s| s.id());
                info!(?id, assignment = %self.assignment.id(), "submitted");
                self.form = None;
                Outcome::show(Notice::success("Success", "Assignment submitted successfully!"))
                    .and_navigate(Route::PendingSubmissions)
            }
            Err(err) => {
                warn!("could not submit assignment: {err:#}");
                Outcome::show(Notice::error(SUBMIT_FAILED_MESSAGE))
            }
        }
    }
}
