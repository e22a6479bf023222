//! Salesforce metadata tool server on stdin/stdout.
//!
//! ```sh
//! export SF_AUTH_URL='force://PlatformCLI::...'
//! RUST_LOG=busbar_sf_tools=debug cargo run --bin busbar-sf-mcp
//! ```
//!
//! Without `SF_AUTH_URL` the server falls back to `SF_INSTANCE_URL` and
//! `SF_ACCESS_TOKEN`. With neither it still starts; every org-facing tool
//! then answers `NotAuthenticated` until a session exists.

use std::sync::Arc;

use anyhow::Context;
use busbar_sf_auth::{OAuthConfig, SalesforceCredentials, Session, SessionStore};
use busbar_sf_tools::{McpServer, ServerConfig, ToolContext};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries protocol messages only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    info!(
        api_version = %config.api_version,
        timeout_secs = config.poll.timeout.as_secs(),
        interval_secs = config.poll.interval.as_secs(),
        "Configuration loaded"
    );

    let sessions = Arc::new(SessionStore::new());
    if let Some(session) = bootstrap_session(&config).await? {
        sessions.login(session).await;
    } else {
        warn!("No Salesforce credentials in the environment; starting without a session");
    }

    McpServer::new(ToolContext::new(sessions, config))
        .run_stdio()
        .await
        .context("tool server stopped")?;
    Ok(())
}

async fn bootstrap_session(config: &ServerConfig) -> anyhow::Result<Option<Session>> {
    if let Some(auth_url) = non_empty_env("SF_AUTH_URL") {
        let session = Session::from_sfdx_auth_url(&auth_url)
            .await
            .context("SF_AUTH_URL could not be exchanged for a session")?;
        return Ok(Some(session));
    }

    if non_empty_env("SF_INSTANCE_URL").is_none() {
        return Ok(None);
    }
    let credentials =
        SalesforceCredentials::from_env().context("SF_INSTANCE_URL set without SF_ACCESS_TOKEN")?;
    let session = Session::new(credentials);
    Ok(Some(match non_empty_env("SF_CLIENT_ID") {
        Some(client_id) => session.with_oauth(OAuthConfig::new(client_id), &config.login_url),
        None => session,
    }))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
