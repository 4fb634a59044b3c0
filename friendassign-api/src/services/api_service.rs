use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client as HttpClient, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower::buffer::Buffer;
use tower::{BoxError, Service, ServiceBuilder};
use tracing::info;
use url::Url;

use crate::util::api_url;

use super::http_service::{self, http_client};

const MAX_IN_FLIGHT: usize = 4;
const REQUESTS_PER_SECOND: u64 = 10;
const BUFFER_SIZE: usize = 64;

/// Specialized HTTP client for the FriendAssign REST API. Responsible for resolving paths against
/// the deployment's base URL and for pacing requests, but not for interpreting responses.
///
/// The returned service is a cheap-to-clone handle, so any number of flows can share it.
pub async fn service(base_url: Url) -> Result<impl ApiService> {
    let http_client = http_client()?;
    let base_url = base_url.to_string();

    let paced = ServiceBuilder::new()
        .concurrency_limit(MAX_IN_FLIGHT)
        .rate_limit(REQUESTS_PER_SECOND, Duration::from_secs(1))
        .map_request(move |request: ApiRequest| request.request_builder(&http_client, &base_url))
        .service(http_service::service());

    Ok(ServiceBuilder::new()
        .map_err(|err: BoxError| anyhow!(err))
        .service(Buffer::<_, ApiRequest>::new(paced, BUFFER_SIZE)))
}

pub trait ApiService:
    Service<ApiRequest, Response = ApiResponse, Error = anyhow::Error, Future: Send>
    + Clone
    + Send
    + Sync
    + 'static
{
}
impl<T> ApiService for T where
    T: Service<ApiRequest, Response = ApiResponse, Error = anyhow::Error, Future: Send>
        + Clone
        + Send
        + Sync
        + 'static
{
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    json: Option<serde_json::Value>,
    timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query: Vec::new(),
            json: None,
            timeout: None,
        }
    }

    pub fn get(path: String) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        self.json.as_ref()
    }

    pub fn request_builder(&self, http_client: &HttpClient, base_url: &str) -> RequestBuilder {
        let url = api_url(base_url, &self.path);
        info!(%url, method = %self.method, "preparing API request");

        let base = http_client
            .request(self.method.clone(), url)
            .header("Accept", "application/json");

        let with_query = if self.query.is_empty() {
            base
        } else {
            base.query(&self.query)
        };

        let with_json = if let Some(body) = &self.json {
            with_query.json(body)
        } else {
            with_query
        };

        if let Some(timeout) = &self.timeout {
            with_json.timeout(*timeout)
        } else {
            with_json
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }

    pub fn json_body(status: StatusCode, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body)
            .with_context(|| format!("could not parse response body as JSON ({})", self.status))
    }

    /// Turns non-2xx responses into a [`ServerError`], keeping the server's `message` if it sent
    /// one.
    pub fn error_for_status(self) -> Result<Self, ServerError> {
        if self.status.is_success() {
            return Ok(self);
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_str::<ErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty());

        Err(ServerError {
            status: self.status,
            message,
        })
    }
}

/// A request that reached the server but was refused or failed there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("server responded with {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct ServerError {
    status: StatusCode,
    message: Option<String>,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Finds the server's own message anywhere in an error chain.
    pub fn message_in(err: &anyhow::Error) -> Option<&str> {
        err.chain()
            .find_map(|cause| cause.downcast_ref::<ServerError>())
            .and_then(ServerError::message)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_for_status_keeps_server_message() {
        let response = ApiResponse::json_body(
            StatusCode::FORBIDDEN,
            &json!({ "message": "Only the creator can delete this assignment" }),
        );
        let err = response.error_for_status().unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.message(),
            Some("Only the creator can delete this assignment")
        );
    }

    #[test]
    fn error_for_status_tolerates_non_json_bodies() {
        let response = ApiResponse::new(StatusCode::BAD_GATEWAY, "<html>".to_owned());
        let err = response.error_for_status().unwrap_err();
        assert_eq!(err.message(), None);
        assert_eq!(err.to_string(), "server responded with 502 Bad Gateway");
    }

    #[test]
    fn server_message_is_found_through_context() {
        let err = anyhow::Error::new(ServerError {
            status: StatusCode::BAD_REQUEST,
            message: Some("Already graded".to_owned()),
        })
        .context("could not mark submission");
        assert_eq!(ServerError::message_in(&err), Some("Already graded"));
    }
}
