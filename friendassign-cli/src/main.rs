use std::process::ExitCode;

use anyhow::Result;
use app_utils::{InitFromEnv, init_from_env, init_tracing};
use clap::Parser;
use friendassign_cli::cli::{Cli, Command};
use friendassign_cli::{App, render, sign_in_from_env, sign_up_from_env};
use tracing::debug;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing()?;

    let InitFromEnv {
        config,
        api,
        store,
        auth,
    } = init_from_env().await?;
    debug!(api_url = %config.api_url, "initialized");

    if let Command::SignUp { name } = cli.command {
        sign_up_from_env(auth.as_ref(), name).await?;
        return Ok(ExitCode::SUCCESS);
    }
    sign_in_from_env(auth.as_ref()).await?;

    let app = App::new(api, store.session(), config.page_size);
    let outcome = app.run(cli.command).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if outcome.notice().is_some() || outcome.route().is_some() {
        println!("{}", render::outcome(&outcome));
    }

    if render::is_failure(&outcome) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
