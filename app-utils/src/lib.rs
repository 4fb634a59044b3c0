use std::env;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use friendassign_api::auth::IdentityToolkit;
use friendassign_api::client::{Client, client};
use friendassign_api::services::api_service::ApiService;
use friendassign_api::session::SessionStore;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt, registry};
use url::Url;

pub const API_URL_VAR: &str = "FRIENDASSIGN_API_URL";
pub const AUTH_KEY_VAR: &str = "FRIENDASSIGN_AUTH_KEY";
pub const PAGE_SIZE_VAR: &str = "FRIENDASSIGN_PAGE_SIZE";

pub const DEFAULT_PAGE_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: Url,
    /// Identity provider API key. Without one, nobody can sign in and every gated action asks
    /// for a login.
    pub auth_key: Option<String>,
    pub page_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup(API_URL_VAR).with_context(|| format!("{API_URL_VAR} is not set"))?;
        let api_url =
            Url::parse(&api_url).with_context(|| format!("{API_URL_VAR} is not a URL: {api_url}"))?;

        let auth_key = lookup(AUTH_KEY_VAR).filter(|key| !key.trim().is_empty());

        let page_size = match lookup(PAGE_SIZE_VAR) {
            Some(size) => size
                .trim()
                .parse()
                .with_context(|| format!("{PAGE_SIZE_VAR} is not a number: {size}"))?,
            None => DEFAULT_PAGE_SIZE,
        };
        if page_size == 0 {
            bail!("{PAGE_SIZE_VAR} must be at least 1");
        }

        Ok(Self {
            api_url,
            auth_key,
            page_size,
        })
    }
}

pub async fn init_from_env() -> Result<InitFromEnv<impl ApiService>> {
    if let Err(err) = dotenv() {
        if !err.not_found() {
            return Err(err).context("could not read .env");
        }
        debug!("no .env file, using the process environment only");
    }

    let config = Config::from_env()?;
    let store = SessionStore::new();

    let api = client(config.api_url.clone()).await?;
    let auth = config
        .auth_key
        .clone()
        .map(|key| IdentityToolkit::new(key, store.clone()))
        .transpose()?;

    Ok(InitFromEnv {
        config,
        api,
        store,
        auth,
    })
}

pub struct InitFromEnv<Service> {
    pub config: Config,
    pub api: Client<Service>,
    pub store: SessionStore,
    pub auth: Option<IdentityToolkit>,
}

pub fn init_tracing() -> Result<()> {
    registry()
        .with(fmt::layer().event_format(format().pretty()))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()
                .context("invalid RUST_LOG directives")?,
        )
        .init();
    Ok(())
}
