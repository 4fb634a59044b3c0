use std::fmt;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

use crate::assignment::{AssignmentId, AssignmentTitle};
use crate::types::{DisplayName, Email, Identity, Marks};

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    id: SubmissionId,
    assignment_id: Option<AssignmentId>,
    assignment_title: AssignmentTitle,
    assignment_marks: Marks,
    link: String,
    notes: String,
    submitter: Identity,
    status: SubmissionStatus,
}

impl Submission {
    pub fn id(&self) -> &SubmissionId {
        &self.id
    }

    pub fn assignment_id(&self) -> Option<&AssignmentId> {
        self.assignment_id.as_ref()
    }

    pub fn assignment_title(&self) -> &AssignmentTitle {
        &self.assignment_title
    }

    /// The assignment's maximum marks, copied onto the submission by the server.
    pub fn assignment_marks(&self) -> Marks {
        self.assignment_marks
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn submitter(&self) -> &Identity {
        &self.submitter
    }

    pub fn status(&self) -> &SubmissionStatus {
        &self.status
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, SubmissionStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionStatus {
    Pending,
    Graded(Grade),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    obtained: Marks,
    feedback: String,
}

impl Grade {
    pub fn obtained(&self) -> Marks {
        self.obtained
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionWire {
    #[serde(rename = "_id")]
    id: Option<String>,
    assignment_id: Option<String>,
    title: Option<String>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    marks: Option<f64>,
    google_docs_link: Option<String>,
    notes: Option<String>,
    user_email: Option<String>,
    user_name: Option<String>,
    status: Option<String>,
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    #[serde(default)]
    obtained_marks: Option<f64>,
    feedback: Option<String>,
}

impl TryFrom<SubmissionWire> for Submission {
    type Error = anyhow::Error;

    fn try_from(wire: SubmissionWire) -> Result<Self> {
        let id = SubmissionId::new(wire.id.context("submission is missing `_id`")?);
        let submitter_email = wire
            .user_email
            .with_context(|| format!("submission `{id}` is missing its submitter's email"))?;

        let status = match wire.status.as_deref().map(str::trim) {
            None | Some("pending") => SubmissionStatus::Pending,
            Some("completed" | "graded") => {
                let obtained = wire
                    .obtained_marks
                    .with_context(|| format!("graded submission `{id}` has no obtained marks"))?;
                SubmissionStatus::Graded(Grade {
                    obtained: Marks::new(obtained)?,
                    feedback: wire.feedback.unwrap_or_default(),
                })
            }
            Some(status) => bail!("submission `{id}` has unknown status \"{status}\""),
        };

        Ok(Self {
            assignment_id: wire.assignment_id.map(AssignmentId::new),
            assignment_title: AssignmentTitle::new(wire.title.unwrap_or_default()),
            assignment_marks: wire
                .marks
                .and_then(|marks| Marks::new(marks).ok())
                .unwrap_or_default(),
            link: wire.google_docs_link.unwrap_or_default(),
            notes: wire.notes.unwrap_or_default(),
            submitter: Identity::new(
                Email::new(submitter_email),
                DisplayName::or_anonymous(wire.user_name),
            ),
            status,
            id,
        })
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId {
    id: String,
}

impl SubmissionId {
    pub fn new(id: String) -> Self {
        Self { id }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.id.fmt(f)
    }
}

impl From<&str> for SubmissionId {
    fn from(id: &str) -> Self {
        Self::new(id.to_owned())
    }
}

/// Body for `POST /api/assignments/{id}/submit`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDraft {
    pub google_docs_link: String,
    pub notes: String,
    pub user_email: Email,
    pub user_name: DisplayName,
}

/// Body for `PUT /api/submissions/{id}/mark`. The grader is whoever `user_email` names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeDraft {
    pub obtained_marks: Marks,
    pub feedback: String,
    pub user_email: Email,
}
