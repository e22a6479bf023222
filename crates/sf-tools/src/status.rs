//! Deploy status lookup by job id.

use busbar_sf_client::security::url as url_security;
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::ToolContext;
use crate::envelope::ToolResponse;
use crate::error::{Error, Result};
use crate::registry::{invoke, ToolArgs, ToolDefinition, ToolHandler};

#[derive(Debug, Clone, Deserialize)]
pub struct StatusArgs {
    pub job_id: String,
}

impl ToolArgs for StatusArgs {
    fn identifiers(&self) -> Vec<(&'static str, String)> {
        vec![("job_id", self.job_id.clone())]
    }
}

/// One status request. Safe to repeat at any time after submission.
///
/// `success` reports whether the status was read and the job has not
/// failed; an unfinished job answers `success: true, done: false`.
pub async fn get_metadata_deploy_status(
    ctx: &ToolContext,
    args: StatusArgs,
) -> Result<ToolResponse> {
    let job_id = args.job_id.trim();
    if !url_security::is_valid_salesforce_id(job_id) {
        return Err(Error::validation(format!(
            "'{job_id}' is not a 15 or 18 character deploy job id"
        )));
    }

    let conn = ctx.connect().await?;
    let outcome = conn.monitor().check(job_id).await?;
    let failed = outcome.state.is_terminal() && !outcome.state.is_success();

    let mut response = if failed {
        ToolResponse::from_error(
            Some("get_metadata_deploy_status"),
            &Error::new(crate::ErrorKind::DeployFailure {
                job_id: outcome.job_id.clone(),
                state: outcome.state,
                failures: outcome.component_failures.clone(),
                summary: outcome
                    .failure_summary()
                    .unwrap_or_else(|| "no diagnostics reported".to_string()),
            }),
        )
    } else {
        ToolResponse::success(Some("get_metadata_deploy_status")).with_outcome(&outcome)
    };

    response = response
        .with("job_id", &outcome.job_id)
        .with("status", outcome.state.as_str())
        .with("done", outcome.done)
        .with_opt("remoteStatus", outcome.remote_status.as_deref())
        .with_opt("numberComponentsDeployed", outcome.number_components_deployed)
        .with_opt("numberComponentsTotal", outcome.number_components_total);
    if !outcome.component_results.is_empty() {
        response = response.with("details", &outcome.component_results);
    }
    Ok(response)
}

pub struct GetMetadataDeployStatus;

impl ToolHandler for GetMetadataDeployStatus {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "get_metadata_deploy_status",
            "Read the current state of a metadata deploy job, e.g. one that was still \
             running when a create or update tool stopped waiting.",
            json!({
                "type": "object",
                "properties": {
                    "job_id": {"type": "string", "description": "Deploy job id returned by a create or update tool"}
                },
                "required": ["job_id"]
            }),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("get_metadata_deploy_status", args, move |a| {
            get_metadata_deploy_status(ctx, a)
        }))
    }
}
