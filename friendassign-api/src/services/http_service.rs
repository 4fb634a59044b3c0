use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client as HttpClient, RequestBuilder};
use tower::{Service, service_fn};
use tracing::debug;

use super::api_service::ApiResponse;

/// Executes prepared requests and buffers their bodies. Knows nothing about the API's paths or
/// payloads; rate limiting and concurrency are layered on by [`super::api_service::service`].
pub fn service() -> impl HttpService {
    service_fn(|request_builder: RequestBuilder| async move {
        let response = request_builder
            .send()
            .await
            .context("request never completed")?;
        let status = response.status();
        let body = response
            .text()
            .await
            .context("could not read response body")?;
        debug!(%status, body_len = body.len(), "got response");
        Ok(ApiResponse::new(status, body))
    })
}

pub trait HttpService:
    Service<RequestBuilder, Response = ApiResponse, Error = anyhow::Error, Future: Send>
    + Send
    + 'static
{
}
impl<T> HttpService for T where
    T: Service<RequestBuilder, Response = ApiResponse, Error = anyhow::Error, Future: Send>
        + Send
        + 'static
{
}

pub fn http_client() -> Result<HttpClient> {
    let client = HttpClient::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    Ok(client)
}
