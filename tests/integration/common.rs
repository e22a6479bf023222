use std::sync::Arc;

use busbar_sf_auth::{Session, SessionStore};
use busbar_sf_tools::{ServerConfig, ToolContext, ToolRegistry};
use serde_json::Value;

/// A tool context logged in through `SF_AUTH_URL`.
///
/// Panics with setup instructions when the variable is missing or the
/// exchange fails; a live test should fail loudly, not skip.
pub async fn live_context() -> ToolContext {
    let auth_url = match std::env::var("SF_AUTH_URL") {
        Ok(url) if url.starts_with("force://") => url,
        Ok(_) => panic!(
            "SF_AUTH_URL must be an SFDX auth URL (force://...). \
             Get one with: sf org display --verbose"
        ),
        Err(_) => panic!(
            "SF_AUTH_URL is not set. Authenticate a scratch org, then \
             export SF_AUTH_URL from `sf org display --verbose`"
        ),
    };

    let session = Session::from_sfdx_auth_url(&auth_url)
        .await
        .unwrap_or_else(|e| panic!("SF_AUTH_URL could not be exchanged: {e}"));

    let sessions = Arc::new(SessionStore::new());
    sessions.login(session).await;
    let config = ServerConfig::from_env().expect("deploy settings from env");
    ToolContext::new(sessions, config)
}

pub async fn call(ctx: &ToolContext, tool: &str, args: Value) -> Value {
    ToolRegistry::builtin()
        .call(ctx, tool, args)
        .await
        .unwrap_or_else(|| panic!("{tool} is not registered"))
        .into_value()
}

/// Suffix that keeps repeated runs from colliding on names.
pub fn unique_suffix() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{}", nanos % 1_000_000_000)
}
