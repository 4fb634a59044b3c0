//! Creating and updating assignments.

use chrono::{Local, NaiveDate};
use friendassign_api::assignment::{Assignment, AssignmentDraft, AssignmentId, Difficulty, DueDate};
use friendassign_api::client::Client;
use friendassign_api::services::api_service::ApiService;
use friendassign_api::session::Session;
use friendassign_api::types::Identity;
use tracing::{info, warn};

use crate::board::server_message_or;
use crate::gate::{Gated, gated};
use crate::notice::{Notice, Outcome, Route, TOAST_DURATION};
use crate::validation::{Field, FieldError, has_min_chars, is_image_url, parse_positive_marks};

pub const MIN_TITLE_CHARS: usize = 5;
pub const MIN_DESCRIPTION_CHARS: usize = 20;

pub const CREATE_FAILED_MESSAGE: &str = "Failed to save assignment.";
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update assignment.";
pub const EDIT_LOAD_FAILED_MESSAGE: &str = "Failed to load assignment data.";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentForm {
    pub title: String,
    pub description: String,
    pub marks: String,
    pub thumbnail_url: String,
    pub difficulty: Difficulty,
    pub due_date: NaiveDate,
}

impl AssignmentForm {
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            marks: String::new(),
            thumbnail_url: String::new(),
            difficulty: Difficulty::Easy,
            due_date: today,
        }
    }

    pub fn from_assignment(assignment: &Assignment) -> Self {
        Self {
            title: assignment.title().to_string(),
            description: assignment.description().to_owned(),
            marks: assignment.marks().to_string(),
            thumbnail_url: assignment.thumbnail_url().to_owned(),
            difficulty: assignment.difficulty(),
            due_date: assignment.due_date().date(),
        }
    }

    /// Checks every field and collects all problems at once. A past due date is only an error when
    /// `earliest_due` is given, which creation does and updating does not.
    pub fn validate(
        &self,
        owner: Option<&Identity>,
        earliest_due: Option<NaiveDate>,
    ) -> Result<AssignmentDraft, Vec<FieldError>> {
        let mut errors = Vec::new();

        if !has_min_chars(&self.title, MIN_TITLE_CHARS) {
            errors.push(FieldError::new(
                Field::Title,
                "Title must be at least 5 characters.",
            ));
        }
        if !has_min_chars(&self.description, MIN_DESCRIPTION_CHARS) {
            errors.push(FieldError::new(
                Field::Description,
                "Description must be at least 20 characters.",
            ));
        }
        let marks = parse_positive_marks(&self.marks);
        if marks.is_none() {
            errors.push(FieldError::new(Field::Marks, "Marks must be a positive number."));
        }
        if !is_image_url(&self.thumbnail_url) {
            errors.push(FieldError::new(Field::ThumbnailUrl, "Valid image URL required."));
        }
        if earliest_due.is_some_and(|earliest| self.due_date < earliest) {
            errors.push(FieldError::new(
                Field::DueDate,
                "Due date must be today or future.",
            ));
        }
        if owner.is_none() {
            errors.push(FieldError::new(Field::Owner, "User email required."));
        }

        match (marks, owner) {
            (Some(marks), Some(owner)) if errors.is_empty() => Ok(AssignmentDraft {
                title: self.title.trim().to_owned(),
                description: self.description.trim().to_owned(),
                marks,
                thumbnail_url: self.thumbnail_url.trim().to_owned(),
                difficulty: self.difficulty,
                due_date: DueDate::new(self.due_date),
                user_email: owner.email().clone(),
                user_name: owner.display_name().clone(),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Update(AssignmentId),
}

/// View-model for the create and update pages.
#[derive(Debug)]
pub struct AssignmentEditor<Service> {
    client: Client<Service>,
    session: Session,
    mode: EditorMode,
    form: AssignmentForm,
    today: NaiveDate,
    saving: bool,
}

impl<Service: ApiService> AssignmentEditor<Service> {
    pub fn create(client: Client<Service>, session: Session) -> Self {
        let today = today();
        Self {
            client,
            session,
            mode: EditorMode::Create,
            form: AssignmentForm::blank(today),
            today,
            saving: false,
        }
    }

    /// Opens the update page, pre-filled from a fresh copy. Only the owner gets in.
    pub async fn load_for_edit(
        client: Client<Service>,
        session: Session,
        id: &AssignmentId,
    ) -> Result<Self, Outcome> {
        let result = gated(
            &session,
            || client.get_assignment(id),
            |_, assignment| async move { assignment },
        )
        .await;

        let assignment = match result {
            Gated::Allowed(assignment) => assignment,
            Gated::LoginRequired => {
                return Err(Outcome::show(Notice::login_required(
                    "Not Logged In",
                    "Please log in to edit assignments.",
                ))
                .and_navigate(Route::Login));
            }
            Gated::Unauthorized => {
                return Err(Outcome::show(Notice::unauthorized(
                    "You can only edit your own assignments.",
                ))
                .and_navigate(Route::Assignments));
            }
            Gated::FetchFailed(_) => {
                return Err(Outcome::show(Notice::error(EDIT_LOAD_FAILED_MESSAGE)));
            }
        };

        Ok(Self {
            form: AssignmentForm::from_assignment(&assignment),
            mode: EditorMode::Update(assignment.id().clone()),
            client,
            session,
            today: today(),
            saving: false,
        })
    }

    /// Pins "today" for due date checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        if self.mode == EditorMode::Create {
            self.form.due_date = today;
        }
        self
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn form(&self) -> &AssignmentForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut AssignmentForm {
        &mut self.form
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Validates, then creates or updates depending on the mode. Nothing is sent unless every
    /// field is valid.
    pub async fn save(&mut self) -> Outcome {
        if self.saving {
            return Outcome::nothing();
        }

        let identity = self.session.identity();
        let earliest_due = match self.mode {
            EditorMode::Create => Some(self.today),
            EditorMode::Update(_) => None,
        };
        let draft = match self.form.validate(identity.as_ref(), earliest_due) {
            Ok(draft) => draft,
            Err(errors) => {
                return Outcome::show(Notice::validation(
                    "Please fix the errors in the form.",
                    errors,
                ));
            }
        };

        self.saving = true;
        let outcome = match &self.mode {
            EditorMode::Create => match self.client.create_assignment(&draft).await {
                Ok(created) => {
                    info!(id = ?created.as_ref().map(|a| a.id()), "assignment created");
                    self.form = AssignmentForm::blank(self.today);
                    Outcome::show(
                        Notice::success("Success", "Assignment created successfully!")
                            .dismiss_after(TOAST_DURATION),
                    )
                    .and_navigate(Route::Assignments)
                }
                Err(err) => {
                    warn!("could not create assignment: {err:#}");
                    Outcome::show(Notice::error(CREATE_FAILED_MESSAGE))
                }
            },
            EditorMode::Update(id) => match self.client.update_assignment(id, &draft).await {
                Ok(_) => {
                    info!(%id, "assignment updated");
                    Outcome::show(
                        Notice::success("Success", "Assignment updated!")
                            .dismiss_after(TOAST_DURATION),
                    )
                    .and_navigate(Route::Assignments)
                }
                Err(err) => {
                    warn!(%id, "could not update assignment: {err:#}");
                    Outcome::show(Notice::error(server_message_or(&err, UPDATE_FAILED_MESSAGE)))
                }
            },
        };
        self.saving = false;
        outcome
    }
}
