use anyhow::{Context, Result};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::assignment::{
    Assignment, AssignmentDraft, AssignmentFilter, AssignmentId, AssignmentWire,
};
use crate::services::api_service::{self, ApiRequest, ApiResponse, ApiService};
use crate::submission::{
    GradeDraft, Submission, SubmissionDraft, SubmissionId, SubmissionWire,
};
use crate::types::Email;
use crate::util::*;

/// Connects to the API at `base_url` with the default request pacing.
pub async fn client(base_url: Url) -> Result<Client<impl ApiService>> {
    let service = api_service::service(base_url).await?;
    Ok(Client::new(service))
}

/// Typed access to the FriendAssign REST API. Every method is a single request; nothing is cached,
/// so each view sees whatever the server says at the moment it asks.
#[derive(Debug, Clone)]
pub struct Client<Service> {
    service: Service,
}

impl<Service: ApiService> Client<Service> {
    pub fn new(service: Service) -> Self {
        Self { service }
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .context("API request failed")?
            .error_for_status()
            .context("API responded with an error")?;
        Ok(response)
    }

    async fn send_json(&self, request: ApiRequest) -> Result<Value> {
        self.send(request).await?.json()
    }

    /// Sends a write. Any 2xx counts as done; the entity the server echoes back is returned when it
    /// parses, since some servers answer with a bare acknowledgement instead.
    async fn send_write<Wire, T>(&self, request: ApiRequest) -> Result<Option<T>>
    where
        Wire: DeserializeOwned,
        T: TryFrom<Wire, Error = anyhow::Error>,
    {
        let path = request.path().to_owned();
        let response = self.send(request).await?;
        let echoed = response
            .json::<Value>()
            .and_then(parse_one::<Wire, T>);
        match echoed {
            Ok(entity) => Ok(Some(entity)),
            Err(err) => {
                warn!(%path, "write succeeded without an entity in the response: {err:#}");
                Ok(None)
            }
        }
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn list_assignments(&self, filter: &AssignmentFilter) -> Result<Vec<Assignment>> {
        let request = ApiRequest::get(ASSIGNMENTS_PATH.to_owned()).with_query(filter.query_pairs());
        let values: Vec<Value> = serde_json::from_value(self.send_json(request).await?)
            .context("assignment list is not an array")?;

        let fetched = values.len();
        let assignments = parse_list::<AssignmentWire, Assignment>(values, "assignment");
        debug!(fetched, kept = assignments.len(), "got assignments");

        Ok(assignments)
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn get_assignment(&self, id: &AssignmentId) -> Result<Assignment> {
        let request = ApiRequest::get(assignment_path(id));
        let value = self.send_json(request).await?;
        parse_one::<AssignmentWire, Assignment>(value)
            .with_context(|| format!("malformed assignment `{id}`"))
    }

    #[tracing::instrument(skip(self, draft), fields(title = %draft.title), err)]
    pub async fn create_assignment(&self, draft: &AssignmentDraft) -> Result<Option<Assignment>> {
        let request = ApiRequest::new(Method::POST, ASSIGNMENTS_PATH.to_owned())
            .with_json(serde_json::to_value(draft)?);
        let created = self.send_write::<AssignmentWire, Assignment>(request).await?;
        info!(id = ?created.as_ref().map(Assignment::id), "created assignment");
        Ok(created)
    }

    #[tracing::instrument(skip(self, draft), err)]
    pub async fn update_assignment(
        &self,
        id: &AssignmentId,
        draft: &AssignmentDraft,
    ) -> Result<Option<Assignment>> {
        let request =
            ApiRequest::new(Method::PUT, assignment_path(id)).with_json(serde_json::to_value(draft)?);
        self.send_write::<AssignmentWire, Assignment>(request).await
    }

    /// The acting user's email travels with the request so the server can check ownership itself.
    #[tracing::instrument(skip(self), err)]
    pub async fn delete_assignment(&self, id: &AssignmentId, actor: &Email) -> Result<()> {
        let request = ApiRequest::new(Method::DELETE, assignment_path(id))
            .with_json(serde_json::json!({ "userEmail": actor }));
        self.send(request).await?;
        info!(%id, "deleted assignment");
        Ok(())
    }

    #[tracing::instrument(skip(self, draft), err)]
    pub async fn submit_assignment(
        &self,
        id: &AssignmentId,
        draft: &SubmissionDraft,
    ) -> Result<Option<Submission>> {
        let request =
            ApiRequest::new(Method::POST, submit_path(id)).with_json(serde_json::to_value(draft)?);
        self.send_write::<SubmissionWire, Submission>(request).await
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn pending_submissions(&self) -> Result<Vec<Submission>> {
        let request = ApiRequest::get(PENDING_SUBMISSIONS_PATH.to_owned());
        let values: Vec<Value> = serde_json::from_value(self.send_json(request).await?)
            .context("pending submission list is not an array")?;
        Ok(parse_list::<SubmissionWire, Submission>(
            values,
            "submission",
        ))
    }

    #[tracing::instrument(skip(self, grade), err)]
    pub async fn mark_submission(
        &self,
        id: &SubmissionId,
        grade: &GradeDraft,
    ) -> Result<Option<Submission>> {
        let request =
            ApiRequest::new(Method::PUT, mark_path(id)).with_json(serde_json::to_value(grade)?);
        self.send_write::<SubmissionWire, Submission>(request).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::assignment::Difficulty;
    use crate::services::api_service::ServerError;
    use crate::testing::{FakeBackend, assignment_json, submission_json};
    use crate::types::{DisplayName, Marks};

    #[tokio::test]
    async fn list_sends_filter_and_skips_malformed_entries() {
        let backend = FakeBackend::new();
        backend.insert_assignment(assignment_json("1", "Rust basics", "Easy", 10, "a@x.com"));
        backend.insert_assignment(assignment_json("2", "Rust async", "Hard", 30, "a@x.com"));
        backend.insert_assignment(json!({ "_id": "3", "title": "Rust, broken", "difficulty": "Easy" }));
        let client = Client::new(backend.service());

        let filter = AssignmentFilter {
            difficulty: Some(Difficulty::Easy),
            search: "rust".to_owned(),
        };
        let assignments = client.list_assignments(&filter).await.unwrap();

        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].id().as_str(), "1");

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query_value("difficulty"), Some("Easy"));
        assert_eq!(requests[0].query_value("search"), Some("rust"));
    }

    #[tokio::test]
    async fn delete_carries_actor_and_surfaces_server_message() {
        let backend = FakeBackend::new();
        backend.insert_assignment(assignment_json("1", "Essay", "Easy", 10, "a@x.com"));
        let client = Client::new(backend.service());

        let err = client
            .delete_assignment(&"1".into(), &Email::from("b@x.com"))
            .await
            .unwrap_err();
        assert!(ServerError::message_in(&err).is_some());

        client
            .delete_assignment(&"1".into(), &Email::from("a@x.com"))
            .await
            .unwrap();

        let last = backend.requests().pop().unwrap();
        assert_eq!(*last.method(), Method::DELETE);
        assert_eq!(last.json(), Some(&json!({ "userEmail": "a@x.com" })));
        assert!(backend.assignment("1").is_none());
    }

    #[tokio::test]
    async fn acknowledged_writes_succeed_without_an_entity() {
        let backend = FakeBackend::new();
        backend.insert_assignment(assignment_json("1", "Essay", "Easy", 10, "a@x.com"));
        backend.insert_submission(submission_json("s1", "1", "Essay", 10, "b@x.com"));
        backend.acknowledge_writes();
        let client = Client::new(backend.service());

        let draft = SubmissionDraft {
            google_docs_link: "https://docs.google.com/document/d/x".to_owned(),
            notes: String::new(),
            user_email: Email::from("c@x.com"),
            user_name: DisplayName::anonymous(),
        };
        let submitted = client.submit_assignment(&"1".into(), &draft).await.unwrap();
        assert!(submitted.is_none());

        let grade = GradeDraft {
            obtained_marks: Marks::ZERO,
            feedback: String::new(),
            user_email: Email::from("a@x.com"),
        };
        let marked = client.mark_submission(&"s1".into(), &grade).await.unwrap();
        assert!(marked.is_none());
        assert_eq!(backend.submission("s1").unwrap()["status"], "completed");
    }

    #[tokio::test]
    async fn echoed_entity_is_returned_when_it_parses() {
        let backend = FakeBackend::new();
        backend.insert_submission(submission_json("s1", "1", "Essay", 10, "b@x.com"));
        let client = Client::new(backend.service());

        let grade = GradeDraft {
            obtained_marks: Marks::ZERO,
            feedback: String::new(),
            user_email: Email::from("a@x.com"),
        };
        let marked = client.mark_submission(&"s1".into(), &grade).await.unwrap();
        assert_eq!(marked.unwrap().id().as_str(), "s1");
    }

    #[tokio::test]
    async fn missing_assignment_is_an_error() {
        let backend = FakeBackend::new();
        let client = Client::new(backend.service());

        let err = client.get_assignment(&"nope".into()).await.unwrap_err();
        let server = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ServerError>())
            .unwrap();
        assert_eq!(server.status(), StatusCode::NOT_FOUND);
    }
}
