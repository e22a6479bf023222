//! Session status and logout.

use busbar_sf_auth::{Credentials, OAuthClient};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::context::ToolContext;
use crate::envelope::ToolResponse;
use crate::error::Result;
use crate::registry::{invoke, ToolArgs, ToolDefinition, ToolHandler};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthStatusArgs {}

impl ToolArgs for AuthStatusArgs {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutArgs {
    /// Also revoke the token at the login host.
    #[serde(default)]
    pub revoke: bool,
}

impl ToolArgs for LogoutArgs {}

pub async fn salesforce_auth_status(ctx: &ToolContext, _args: AuthStatusArgs) -> Result<ToolResponse> {
    let status = ctx.sessions().status().await;
    let message = if status.authenticated {
        "Connected to Salesforce"
    } else {
        "No Salesforce session; set SF_AUTH_URL or SF_INSTANCE_URL and SF_ACCESS_TOKEN"
    };

    Ok(ToolResponse::success(Some("salesforce_auth_status"))
        .with("authenticated", status.authenticated)
        .with_opt("instance_url", status.instance_url)
        .with_opt("api_version", status.api_version)
        .with_opt("established_at", status.established_at)
        .with_opt("session_age_secs", status.session_age_secs)
        .with("can_refresh", status.can_refresh)
        .with("deploy_api_version", &ctx.config().api_version)
        .with("message", message))
}

/// Clears the session. Revocation failure is reported but the session
/// stays cleared.
pub async fn salesforce_logout(ctx: &ToolContext, args: LogoutArgs) -> Result<ToolResponse> {
    let Some(session) = ctx.sessions().logout().await else {
        return Ok(ToolResponse::success(Some("salesforce_logout"))
            .with("was_authenticated", false)
            .with("message", "No session was established"));
    };

    let mut response = ToolResponse::success(Some("salesforce_logout")).with("was_authenticated", true);

    if args.revoke {
        let token = session
            .credentials()
            .refresh_token()
            .unwrap_or_else(|| session.credentials().access_token());
        let revoked = match session.oauth_config() {
            Some(config) => {
                match OAuthClient::new(config.clone())
                    .revoke_token(token, session.login_url())
                    .await
                {
                    Ok(()) => {
                        info!("Token revoked");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(error = %e, "Token revocation failed");
                        Err(e.to_string())
                    }
                }
            }
            None => Err("session has no OAuth client to revoke through".to_string()),
        };
        response = match revoked {
            Ok(()) => response.with("revoked", true),
            Err(e) => response.with("revoked", false).with("revoke_error", e),
        };
    }

    Ok(response.with("message", "Logged out of Salesforce"))
}

pub struct AuthStatus;

impl ToolHandler for AuthStatus {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "salesforce_auth_status",
            "Report whether a Salesforce session is established and which org it targets.",
            json!({"type": "object", "properties": {}}),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("salesforce_auth_status", args, move |a| {
            salesforce_auth_status(ctx, a)
        }))
    }
}

pub struct Logout;

impl ToolHandler for Logout {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "salesforce_logout",
            "Clear the Salesforce session. With revoke, also invalidate the token at the login host.",
            json!({
                "type": "object",
                "properties": {
                    "revoke": {"type": "boolean", "default": false}
                }
            }),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("salesforce_logout", args, move |a| {
            salesforce_logout(ctx, a)
        }))
    }
}
