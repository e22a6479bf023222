//! Steps shared by every deploy orchestration.

use busbar_sf_metadata::{
    ComponentFailure, DeployMode, DeployOutcome, DeployPackage, DeployState,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::context::{Connection, QueryScope};
use crate::error::{Error, ErrorKind, Result};

/// Whether an orchestration needs the entity to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Precondition {
    Absent,
    Present,
}

/// Run the existence check and enforce the precondition. Returns the
/// existing record for updates.
pub(crate) async fn check_existence(
    conn: &Connection,
    scope: QueryScope,
    soql: &str,
    precondition: Precondition,
    entity: &str,
) -> Result<Option<Value>> {
    let existing = conn.find_one(scope, soql).await?;
    match (precondition, existing) {
        (Precondition::Absent, Some(_)) => Err(Error::new(ErrorKind::Conflict(format!(
            "{entity} already exists; use the matching update tool to change it"
        )))),
        (Precondition::Present, None) => Err(Error::new(ErrorKind::NotFound(format!(
            "{entity} does not exist; use the matching create tool to add it"
        )))),
        (_, existing) => Ok(existing),
    }
}

/// Submit once, poll to a terminal state, and turn anything but success
/// into an error.
#[instrument(skip(conn, package), fields(members = package.member_count()))]
pub(crate) async fn deploy(
    conn: &Connection,
    package: &DeployPackage,
    mode: DeployMode,
) -> Result<DeployOutcome> {
    let job = conn.metadata().submit(package, mode).await?;
    let outcome = conn.monitor().poll(&job.id).await;
    info!(job_id = %outcome.job_id, state = %outcome.state, ?mode, "Deploy settled");
    settle(outcome)
}

pub(crate) fn settle(outcome: DeployOutcome) -> Result<DeployOutcome> {
    match outcome.state {
        state if state.is_success() => Ok(outcome),
        DeployState::TimedOut => {
            warn!(job_id = %outcome.job_id, "Deploy outcome unknown after polling window");
            Err(Error::new(ErrorKind::TimedOut {
                job_id: outcome.job_id,
                last_error: outcome.error_message,
            }))
        }
        state => {
            let summary = outcome
                .failure_summary()
                .unwrap_or_else(|| "no diagnostics reported".to_string());
            let failures = if outcome.component_failures.is_empty() {
                vec![ComponentFailure {
                    problem: Some(summary.clone()),
                    problem_type: Some("Error".to_string()),
                    ..Default::default()
                }]
            } else {
                outcome.component_failures
            };
            Err(Error::new(ErrorKind::DeployFailure {
                job_id: outcome.job_id,
                state,
                failures,
                summary,
            }))
        }
    }
}

/// API version recorded on an existing record, e.g. `ApiVersion: 58.0`.
pub(crate) fn record_api_version(record: &Value) -> Option<String> {
    match record.get("ApiVersion")? {
        Value::Number(n) => n.as_f64().map(|v| format!("{v:.1}")),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
