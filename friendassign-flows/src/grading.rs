//! The pending-submissions table and the grading modal.
//!
//! The list is fetched once. A graded row is removed locally and stays gone until the next
//! [`PendingBoard::load`]; the server would refuse a second grade anyway.

use friendassign_api::client::Client;
use friendassign_api::services::api_service::ApiService;
use friendassign_api::session::Session;
use friendassign_api::submission::{GradeDraft, Submission, SubmissionId};
use serde::Serialize;
use tracing::{info, warn};

use crate::board::server_message_or;
use crate::notice::{Notice, Outcome, Route};
use crate::validation::{Field, FieldError, parse_obtained_marks};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load submissions.";
pub const MARK_FAILED_MESSAGE: &str = "Failed to mark submission.";
pub const NO_NOTES: &str = "No notes provided";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeAction {
    Grade,
    /// The viewer wrote this one, so it shows a "Your Submission" label instead of a button.
    OwnSubmission,
}

impl GradeAction {
    pub fn label(self) -> &'static str {
        match self {
            GradeAction::Grade => "Give Mark",
            GradeAction::OwnSubmission => "Your Submission",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PendingRow<'a> {
    pub submission: &'a Submission,
    pub action: GradeAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeForm {
    submission_id: SubmissionId,
    link: String,
    notes: String,
    pub obtained_marks: String,
    pub feedback: String,
}

impl GradeForm {
    fn new(submission: &Submission) -> Self {
        Self {
            submission_id: submission.id().clone(),
            link: submission.link().to_owned(),
            notes: submission.notes().to_owned(),
            obtained_marks: String::new(),
            feedback: String::new(),
        }
    }

    pub fn submission_id(&self) -> &SubmissionId {
        &self.submission_id
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn notes(&self) -> &str {
        if self.notes.trim().is_empty() {
            NO_NOTES
        } else {
            &self.notes
        }
    }
}

#[derive(Debug)]
pub struct PendingBoard<Service> {
    client: Client<Service>,
    submissions: Vec<Submission>,
    loading: bool,
    form: Option<GradeForm>,
    submitting: bool,
}

impl<Service: ApiService> PendingBoard<Service> {
    pub fn new(client: Client<Service>) -> Self {
        Self {
            client,
            submissions: Vec::new(),
            loading: false,
            form: None,
            submitting: false,
        }
    }

    pub async fn load(&mut self) -> Outcome {
        self.loading = true;
        let result = self.client.pending_submissions().await;
        self.loading = false;

        match result {
            Ok(submissions) => {
                self.submissions = submissions
                    .into_iter()
                    .filter(Submission::is_pending)
                    .collect();
                Outcome::nothing()
            }
            Err(err) => {
                warn!("could not load pending submissions: {err:#}");
                self.submissions.clear();
                Outcome::show(Notice::error(LOAD_FAILED_MESSAGE))
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn rows(&self, session: &Session) -> Vec<PendingRow<'_>> {
        self.submissions
            .iter()
            .map(|submission| PendingRow {
                submission,
                action: if session.is(submission.submitter().email()) {
                    GradeAction::OwnSubmission
                } else {
                    GradeAction::Grade
                },
            })
            .collect()
    }

    pub fn form(&self) -> Option<&GradeForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut GradeForm> {
        self.form.as_mut()
    }

    pub fn open_grade_form(&mut self, session: &Session, id: &SubmissionId) -> Outcome {
        if !session.is_authenticated() {
            return login_to_mark();
        }
        let Some(submission) = self.submissions.iter().find(|s| s.id() == id) else {
            return Outcome::show(Notice::warning(
                "Not Pending",
                "This submission is no longer waiting for a grade.",
            ));
        };
        if session.is(submission.submitter().email()) {
            return Outcome::show(Notice::unauthorized("You cannot grade your own submission."));
        }

        self.form = Some(GradeForm::new(submission));
        Outcome::nothing()
    }

    pub fn close_grade_form(&mut self) {
        self.form = None;
    }

    /// Sends the open grade. Success drops the row; failure keeps both the row and the form.
    pub async fn submit_grade(&mut self, session: &Session) -> Outcome {
        let Some(identity) = session.identity() else {
            return login_to_mark();
        };
        if self.submitting {
            return Outcome::nothing();
        }
        let Some(form) = &self.form else {
            return Outcome::nothing();
        };

        let Some(obtained_marks) = parse_obtained_marks(&form.obtained_marks) else {
            return Outcome::show(Notice::validation(
                "Enter valid marks.",
                vec![FieldError::new(
                    Field::ObtainedMarks,
                    "Marks must be a number of at least 0.",
                )],
            ));
        };

        let id = form.submission_id.clone();
        let grade = GradeDraft {
            obtained_marks,
            feedback: form.feedback.trim().to_owned(),
            user_email: identity.email().clone(),
        };

        self.submitting = true;
        let result = self.client.mark_submission(&id, &grade).await;
        self.submitting = false;

        match result {
            Ok(_) => {
                self.submissions.retain(|submission| submission.id() != &id);
                self.form = None;
                info!(%id, marks = %grade.obtained_marks, "graded submission");
                Outcome::show(Notice::success("Success", "Submission marked!"))
            }
            Err(err) => {
                warn!(%id, "could not mark submission: {err:#}");
                Outcome::show(Notice::error(server_message_or(&err, MARK_FAILED_MESSAGE)))
            }
        }
    }
}

fn login_to_mark() -> Outcome {
    Outcome::show(Notice::login_required(
        "Error",
        "Please log in to mark submissions.",
    ))
    .and_navigate(Route::Login)
}
