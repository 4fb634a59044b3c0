//! In-memory stand-ins for the REST API and the identity provider.
//!
//! [`FakeBackend`] answers the same routes as the real server, records every request it sees and can
//! be told to fail or stall specific calls. Only compiled for tests and the `testing` feature.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{Result, bail};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use tower::service_fn;

use crate::auth::AuthProvider;
use crate::creds::Creds;
use crate::services::api_service::{ApiRequest, ApiResponse, ApiService};
use crate::session::SessionStore;
use crate::types::{DisplayName, Email, Identity};

pub const FAR_FUTURE_DUE_DATE: &str = "2030-01-01T00:00:00.000Z";

pub fn assignment_json(id: &str, title: &str, difficulty: &str, marks: u32, owner: &str) -> Value {
    json!({
        "_id": id,
        "title": title,
        "description": format!("{title}: a description long enough to pass validation."),
        "marks": marks,
        "thumbnailUrl": "https://img.example.com/thumb.png",
        "difficulty": difficulty,
        "dueDate": FAR_FUTURE_DUE_DATE,
        "userEmail": owner,
        "userName": owner.split('@').next().unwrap_or(owner),
    })
}

pub fn submission_json(
    id: &str,
    assignment_id: &str,
    title: &str,
    marks: u32,
    submitter: &str,
) -> Value {
    json!({
        "_id": id,
        "assignmentId": assignment_id,
        "title": title,
        "marks": marks,
        "googleDocsLink": format!("https://docs.google.com/document/d/{id}"),
        "notes": "",
        "userEmail": submitter,
        "userName": submitter.split('@').next().unwrap_or(submitter),
        "status": "pending",
    })
}

#[derive(Debug, Default)]
struct State {
    assignments: Vec<Value>,
    submissions: Vec<Value>,
    requests: Vec<ApiRequest>,
    failures: HashMap<(Method, String), (StatusCode, String)>,
    search_delays: HashMap<String, Duration>,
    acknowledge_writes: bool,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<State>,
    next_id: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_assignment(&self, assignment: Value) {
        self.state().assignments.push(assignment);
    }

    pub fn insert_submission(&self, submission: Value) {
        self.state().submissions.push(submission);
    }

    pub fn assignment(&self, id: &str) -> Option<Value> {
        find(&self.state().assignments, id).cloned()
    }

    pub fn submission(&self, id: &str) -> Option<Value> {
        find(&self.state().submissions, id).cloned()
    }

    pub fn assignment_count(&self) -> usize {
        self.state().assignments.len()
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state().requests.clone()
    }

    /// Makes every `method` request to exactly `path` fail with `status` until [`Self::clear_failures`].
    pub fn fail(&self, method: Method, path: &str, status: StatusCode, message: &str) {
        self.state()
            .failures
            .insert((method, path.to_owned()), (status, message.to_owned()));
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Answers successful POST and PUT requests with a bare acknowledgement instead of the stored
    /// entity, the way a server that returns its driver's write result does.
    pub fn acknowledge_writes(&self) {
        self.state().acknowledge_writes = true;
    }

    /// Stalls list requests whose `search` parameter is exactly `search`.
    pub fn delay_search(&self, search: &str, delay: Duration) {
        self.state().search_delays.insert(search.to_owned(), delay);
    }

    pub fn service(self: &Arc<Self>) -> impl ApiService + use<> {
        let backend = Arc::clone(self);
        service_fn(move |request: ApiRequest| {
            let backend = Arc::clone(&backend);
            async move {
                let delay = backend.record(&request);
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                let response = backend.respond(&request);
                Ok::<_, anyhow::Error>(backend.acknowledged(&request, response))
            }
        })
    }

    fn record(&self, request: &ApiRequest) -> Option<Duration> {
        let mut state = self.state();
        state.requests.push(request.clone());
        if *request.method() == Method::GET && request.path() == "/api/assignments" {
            let search = request.query_value("search").unwrap_or_default();
            state.search_delays.get(search).copied()
        } else {
            None
        }
    }

    fn acknowledged(&self, request: &ApiRequest, response: ApiResponse) -> ApiResponse {
        let is_write = matches!(*request.method(), Method::POST | Method::PUT);
        if !(is_write && response.status().is_success() && self.state().acknowledge_writes) {
            return response;
        }
        let body = if *request.method() == Method::POST {
            json!({ "acknowledged": true, "insertedId": self.fresh_id("ack") })
        } else {
            json!({ "acknowledged": true, "matchedCount": 1, "modifiedCount": 1 })
        };
        ApiResponse::json_body(response.status(), &body)
    }

    fn respond(&self, request: &ApiRequest) -> ApiResponse {
        let mut state = self.state();

        let key = (request.method().clone(), request.path().to_owned());
        if let Some((status, message)) = state.failures.get(&key) {
            return ApiResponse::json_body(*status, &json!({ "message": message }));
        }

        let segments: Vec<&str> = request.path().trim_matches('/').split('/').collect();
        let body = request.json().cloned().unwrap_or(Value::Null);
        let actor = body["userEmail"].as_str().unwrap_or_default().to_owned();

        match (request.method().as_str(), segments.as_slice()) {
            ("GET", ["api", "assignments"]) => {
                let difficulty = request.query_value("difficulty");
                let search = request
                    .query_value("search")
                    .unwrap_or_default()
                    .to_lowercase();
                let matching: Vec<Value> = state
                    .assignments
                    .iter()
                    .filter(|a| difficulty.is_none_or(|d| a["difficulty"] == d))
                    .filter(|a| {
                        a["title"]
                            .as_str()
                            .unwrap_or_default()
                            .to_lowercase()
                            .contains(&search)
                    })
                    .cloned()
                    .collect();
                ok(Value::Array(matching))
            }
            ("POST", ["api", "assignments"]) => {
                let mut created = body;
                created["_id"] = json!(self.fresh_id("a"));
                state.assignments.push(created.clone());
                created_response(created)
            }
            ("GET", ["api", "assignments", id]) => match find(&state.assignments, id) {
                Some(assignment) => ok(assignment.clone()),
                None => not_found("Assignment not found"),
            },
            ("PUT", ["api", "assignments", id]) => {
                let Some(existing) = find_mut(&mut state.assignments, id) else {
                    return not_found("Assignment not found");
                };
                if existing["userEmail"] != actor.as_str() {
                    return forbidden("You can only update your own assignments");
                }
                let mut updated = body;
                updated["_id"] = json!(id);
                *existing = updated.clone();
                ok(updated)
            }
            ("DELETE", ["api", "assignments", id]) => {
                let Some(existing) = find(&state.assignments, id) else {
                    return not_found("Assignment not found");
                };
                if existing["userEmail"] != actor.as_str() {
                    return forbidden("You can only delete your own assignments");
                }
                state.assignments.retain(|a| a["_id"] != *id);
                ok(json!({ "message": "Assignment deleted" }))
            }
            ("POST", ["api", "assignments", id, "submit"]) => {
                let Some(assignment) = find(&state.assignments, id).cloned() else {
                    return not_found("Assignment not found");
                };
                let mut submission = body;
                submission["_id"] = json!(self.fresh_id("s"));
                submission["assignmentId"] = json!(id);
                submission["title"] = assignment["title"].clone();
                submission["marks"] = assignment["marks"].clone();
                submission["status"] = json!("pending");
                state.submissions.push(submission.clone());
                created_response(submission)
            }
            ("GET", ["api", "submissions", "pending"]) => ok(Value::Array(
                state
                    .submissions
                    .iter()
                    .filter(|s| s["status"] == "pending")
                    .cloned()
                    .collect(),
            )),
            ("PUT", ["api", "submissions", id, "mark"]) => {
                let Some(submission) = find_mut(&mut state.submissions, id) else {
                    return not_found("Submission not found");
                };
                if submission["status"] != "pending" {
                    return bad_request("This submission has already been graded");
                }
                if submission["userEmail"] == actor.as_str() {
                    return forbidden("You cannot grade your own submission");
                }
                submission["status"] = json!("completed");
                submission["obtainedMarks"] = body["obtainedMarks"].clone();
                submission["feedback"] = body["feedback"].clone();
                submission["markedBy"] = json!(actor);
                ok(submission.clone())
            }
            _ => not_found("No such route"),
        }
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-new-{n}")
    }
}

fn find<'a>(items: &'a [Value], id: &str) -> Option<&'a Value> {
    items.iter().find(|item| item["_id"] == id)
}

fn find_mut<'a>(items: &'a mut [Value], id: &str) -> Option<&'a mut Value> {
    items.iter_mut().find(|item| item["_id"] == id)
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse::json_body(StatusCode::OK, &body)
}

fn created_response(body: Value) -> ApiResponse {
    ApiResponse::json_body(StatusCode::CREATED, &body)
}

fn not_found(message: &str) -> ApiResponse {
    ApiResponse::json_body(StatusCode::NOT_FOUND, &json!({ "message": message }))
}

fn forbidden(message: &str) -> ApiResponse {
    ApiResponse::json_body(StatusCode::FORBIDDEN, &json!({ "message": message }))
}

fn bad_request(message: &str) -> ApiResponse {
    ApiResponse::json_body(StatusCode::BAD_REQUEST, &json!({ "message": message }))
}

/// Accepts any account registered through it and publishes to the store like the real provider.
#[derive(Debug, Clone)]
pub struct FakeAuth {
    store: SessionStore,
    accounts: Arc<Mutex<HashMap<String, (String, Option<String>)>>>,
}

impl FakeAuth {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            accounts: Arc::default(),
        }
    }

    /// Publishes `email` as signed in without going through credentials.
    pub fn sign_in_as(&self, email: &str, name: &str) -> Identity {
        let identity = Identity::new(
            Email::from(email),
            DisplayName::or_anonymous(Some(name.to_owned())),
        );
        self.store.publish(Some(identity.clone()));
        identity
    }

    fn accounts(&self) -> MutexGuard<'_, HashMap<String, (String, Option<String>)>> {
        self.accounts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AuthProvider for FakeAuth {
    async fn sign_up(&self, creds: &Creds, display_name: Option<String>) -> Result<Identity> {
        {
            let mut accounts = self.accounts();
            if accounts.contains_key(creds.email()) {
                bail!("EMAIL_EXISTS");
            }
            accounts.insert(
                creds.email().to_owned(),
                (creds.password().to_owned(), display_name.clone()),
            );
        }
        let identity = Identity::new(
            Email::from(creds.email()),
            DisplayName::or_anonymous(display_name),
        );
        self.store.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, creds: &Creds) -> Result<Identity> {
        let display_name = match self.accounts().get(creds.email()) {
            Some((password, name)) if password == creds.password() => name.clone(),
            _ => bail!("INVALID_LOGIN_CREDENTIALS"),
        };
        let identity = Identity::new(
            Email::from(creds.email()),
            DisplayName::or_anonymous(display_name),
        );
        self.store.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in_federated(&self, provider_id: &str, id_token: &str) -> Result<Identity> {
        let email = format!("{id_token}@{provider_id}");
        let identity = Identity::new(Email::new(email), DisplayName::anonymous());
        self.store.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.store.publish(None);
        Ok(())
    }
}
