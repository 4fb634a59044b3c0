//! Signing in and out. The provider is an external collaborator; all the rest of the app sees is
//! the [`SessionStore`] it publishes to.

use std::future::Future;

use anyhow::{Context, Result};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::info;

use crate::creds::Creds;
use crate::services::http_service::http_client;
use crate::session::SessionStore;
use crate::types::{DisplayName, Email, Identity};

pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

pub trait AuthProvider: Send + Sync {
    /// Registers a new account and signs it in.
    fn sign_up(
        &self,
        creds: &Creds,
        display_name: Option<String>,
    ) -> impl Future<Output = Result<Identity>> + Send;

    fn sign_in(&self, creds: &Creds) -> impl Future<Output = Result<Identity>> + Send;

    /// Signs in with a token issued by a federated identity provider, e.g. Google.
    fn sign_in_federated(
        &self,
        provider_id: &str,
        id_token: &str,
    ) -> impl Future<Output = Result<Identity>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Firebase Identity Toolkit over plain REST.
#[derive(Debug, Clone)]
pub struct IdentityToolkit {
    http_client: HttpClient,
    endpoint: String,
    api_key: String,
    store: SessionStore,
}

impl IdentityToolkit {
    pub fn new(api_key: String, store: SessionStore) -> Result<Self> {
        Ok(Self {
            http_client: http_client()?,
            endpoint: IDENTITY_TOOLKIT_URL.to_owned(),
            api_key,
            store,
        })
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    async fn call(&self, method: &str, body: Value) -> Result<AccountResponse> {
        let url = format!(
            "{}/accounts:{method}",
            self.endpoint.trim_end_matches('/')
        );
        info!(%url, "calling identity provider");

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("`accounts:{method}` never completed"))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .context("could not read identity provider response")?;

        parse_account_response(status, &text)
            .with_context(|| format!("`accounts:{method}` failed"))
    }
}

impl AuthProvider for IdentityToolkit {
    #[tracing::instrument(skip(self, creds), fields(email = creds.email()), err)]
    async fn sign_up(&self, creds: &Creds, display_name: Option<String>) -> Result<Identity> {
        let account = self
            .call(
                "signUp",
                json!({
                    "email": creds.email(),
                    "password": creds.password(),
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let account = match (&display_name, &account.id_token) {
            (Some(name), Some(id_token)) => {
                self.call(
                    "update",
                    json!({
                        "idToken": id_token,
                        "displayName": name,
                        "returnSecureToken": false,
                    }),
                )
                .await?
            }
            _ => account,
        };

        let identity = account.identity(creds.email())?;
        self.store.publish(Some(identity.clone()));
        Ok(identity)
    }

    #[tracing::instrument(skip(self, creds), fields(email = creds.email()), err)]
    async fn sign_in(&self, creds: &Creds) -> Result<Identity> {
        let account = self
            .call(
                "signInWithPassword",
                json!({
                    "email": creds.email(),
                    "password": creds.password(),
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let identity = account.identity(creds.email())?;
        self.store.publish(Some(identity.clone()));
        Ok(identity)
    }

    #[tracing::instrument(skip(self, id_token), err)]
    async fn sign_in_federated(&self, provider_id: &str, id_token: &str) -> Result<Identity> {
        let account = self
            .call(
                "signInWithIdp",
                json!({
                    "postBody": format!("id_token={id_token}&providerId={provider_id}"),
                    "requestUri": "http://localhost",
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;

        let identity = account.identity("")?;
        self.store.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.store.publish(None);
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    id_token: Option<String>,
    email: Option<String>,
    display_name: Option<String>,
}

impl AccountResponse {
    /// `fallback_email` covers endpoints that only echo the email back sometimes.
    fn identity(self, fallback_email: &str) -> Result<Identity> {
        let email = self
            .email
            .filter(|email| !email.is_empty())
            .or_else(|| Some(fallback_email.to_owned()).filter(|email| !email.is_empty()))
            .context("identity provider did not return an email")?;
        Ok(Identity::new(
            Email::new(email),
            DisplayName::or_anonymous(self.display_name),
        ))
    }
}

/// A refusal from the identity provider, e.g. `EMAIL_EXISTS` or `INVALID_PASSWORD`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("identity provider refused the request ({status}): {code}")]
pub struct AuthError {
    status: StatusCode,
    code: String,
}

impl AuthError {
    pub fn code(&self) -> &str {
        &self.code
    }
}

fn parse_account_response(status: StatusCode, body: &str) -> Result<AccountResponse> {
    if !status.is_success() {
        #[derive(Deserialize)]
        struct ErrorEnvelope {
            error: ErrorBody,
        }
        #[derive(Deserialize)]
        struct ErrorBody {
            message: String,
        }

        let code = serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| "UNKNOWN_ERROR".to_owned());
        return Err(AuthError { status, code }.into());
    }

    serde_json::from_str(body).context("could not parse identity provider response")
}
