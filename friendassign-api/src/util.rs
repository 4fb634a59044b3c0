use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::assignment::AssignmentId;
use crate::submission::SubmissionId;

pub const ASSIGNMENTS_PATH: &str = "/api/assignments";
pub const PENDING_SUBMISSIONS_PATH: &str = "/api/submissions/pending";

pub fn api_url(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

pub fn assignment_path(id: &AssignmentId) -> String {
    format!("{ASSIGNMENTS_PATH}/{id}")
}

pub fn submit_path(id: &AssignmentId) -> String {
    format!("{}/submit", assignment_path(id))
}

pub fn mark_path(id: &SubmissionId) -> String {
    format!("/api/submissions/{id}/mark")
}

/// Converts each element of a list response on its own, so one malformed entry doesn't hide the
/// rest of the list.
pub fn parse_list<Wire, T>(values: Vec<Value>, kind: &str) -> Vec<T>
where
    Wire: DeserializeOwned,
    T: TryFrom<Wire, Error = anyhow::Error>,
{
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match parse_one::<Wire, T>(value) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(index, kind, %err, "skipping malformed list entry");
                None
            }
        })
        .collect()
}

pub fn parse_one<Wire, T>(value: Value) -> Result<T>
where
    Wire: DeserializeOwned,
    T: TryFrom<Wire, Error = anyhow::Error>,
{
    let wire: Wire = serde_json::from_value(value)?;
    T::try_from(wire)
}
