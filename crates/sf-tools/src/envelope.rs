//! The uniform JSON response every tool returns.
//!
//! ```json
//! {"success": false, "operation": "create_custom_field", "field_name": "Tier__c",
//!  "job_id": "0Af...", "status": "Failed", "error": "...",
//!  "errors": {"componentFailures": [...]}}
//! ```
//!
//! `errors` is only present on failure, or on a partial success that
//! carried component warnings.

use busbar_sf_metadata::{ComponentFailure, DeployOutcome, DeployState};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{Error, ErrorKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    body: Map<String, Value>,
}

impl ToolResponse {
    fn base(success: bool, operation: Option<&str>) -> Self {
        let mut body = Map::new();
        body.insert("success".to_string(), Value::Bool(success));
        if let Some(op) = operation {
            body.insert("operation".to_string(), Value::String(op.to_string()));
        }
        Self { body }
    }

    pub fn success(operation: Option<&str>) -> Self {
        Self::base(true, operation)
    }

    /// Failure envelope for an error, carrying whatever structure the
    /// error kind has.
    pub fn from_error(operation: Option<&str>, err: &Error) -> Self {
        let mut response = Self::base(false, operation)
            .with("error", err.to_string())
            .with("error_type", err.error_type());

        match &err.kind {
            ErrorKind::DeployFailure {
                job_id,
                state,
                failures,
                ..
            } => {
                response = response
                    .with("job_id", job_id)
                    .with("status", state.as_str())
                    .with_component_failures(failures);
            }
            ErrorKind::TimedOut { job_id, last_error } => {
                response = response
                    .with("job_id", job_id)
                    .with("status", DeployState::TimedOut.as_str())
                    .with(
                        "message",
                        format!(
                            "Deploy {job_id} did not report a final state in time; call \
                             get_metadata_deploy_status with this job_id to observe it"
                        ),
                    )
                    .with_opt("last_error", last_error.as_deref());
            }
            _ => {}
        }

        if err.is_retryable() {
            response = response.with("retryable", true);
        }
        response
    }

    /// Set a key. Values that fail to serialize are stored as `null`.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.body.insert(key.to_string(), value);
        self
    }

    /// Set a key unless the response already carries it.
    pub fn with_default(mut self, key: &str, value: impl Serialize) -> Self {
        if !self.body.contains_key(key) {
            self.body.insert(
                key.to_string(),
                serde_json::to_value(value).unwrap_or(Value::Null),
            );
        }
        self
    }

    /// Set a key only when the value is present.
    pub fn with_opt<T: Serialize>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }

    /// Job id and terminal state of a successful deploy. Partial successes
    /// keep their component warnings under `errors`.
    pub fn with_outcome(self, outcome: &DeployOutcome) -> Self {
        let response = self
            .with("job_id", &outcome.job_id)
            .with("status", outcome.state.as_str());
        if outcome.state == DeployState::PartiallySucceeded
            && !outcome.component_failures.is_empty()
        {
            response.with_component_failures(&outcome.component_failures)
        } else {
            response
        }
    }

    fn with_component_failures(self, failures: &[ComponentFailure]) -> Self {
        self.with("errors", json!({ "componentFailures": failures }))
    }

    pub fn is_success(&self) -> bool {
        self.body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Result<ToolResponse, Error>> for ToolResponse {
    fn from(result: Result<ToolResponse, Error>) -> Self {
        match result {
            Ok(response) => response,
            Err(err) => ToolResponse::from_error(None, &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(problem: &str) -> ComponentFailure {
        ComponentFailure {
            component_type: Some("CustomField".into()),
            full_name: Some("Invoice__c.Tier__c".into()),
            problem: Some(problem.into()),
            problem_type: Some("Error".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_success_envelope() {
        let response = ToolResponse::success(Some("create_apex_class"))
            .with("class_name", "Greeter")
            .with_opt("description", None::<String>);
        let value = response.clone().into_value();

        assert!(response.is_success());
        assert_eq!(value["operation"], "create_apex_class");
        assert_eq!(value["class_name"], "Greeter");
        assert!(value.get("description").is_none());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_deploy_failure_carries_component_failures() {
        let err = Error::new(ErrorKind::DeployFailure {
            job_id: "0Af000000000001AAA".into(),
            state: DeployState::Failed,
            failures: vec![failure("Picklist must define at least one value")],
            summary: "Invoice__c.Tier__c: Picklist must define at least one value".into(),
        });
        let value = ToolResponse::from_error(Some("create_apex_class"), &err).into_value();

        assert_eq!(value["success"], false);
        assert_eq!(value["job_id"], "0Af000000000001AAA");
        assert_eq!(value["status"], "Failed");
        assert_eq!(value["error_type"], "DeployFailure");
        let failures = value["errors"]["componentFailures"].as_array().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0]["fullName"], "Invoice__c.Tier__c");
        assert!(value.get("retryable").is_none());
    }

    #[test]
    fn test_timed_out_points_at_status_tool() {
        let err = Error::new(ErrorKind::TimedOut {
            job_id: "0Af000000000001AAA".into(),
            last_error: Some("HTTP error: 503 Service Unavailable".into()),
        });
        let value = ToolResponse::from_error(Some("update_apex_class"), &err).into_value();

        assert_eq!(value["status"], "TimedOut");
        assert_eq!(value["retryable"], true);
        assert!(value["message"]
            .as_str()
            .unwrap()
            .contains("get_metadata_deploy_status"));
        assert_eq!(value["last_error"], "HTTP error: 503 Service Unavailable");
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_partial_success_keeps_warnings() {
        let outcome = DeployOutcome {
            state: DeployState::PartiallySucceeded,
            job_id: "0Af000000000001AAA".into(),
            component_results: Vec::new(),
            component_failures: vec![failure("unused variable")],
            error_message: None,
            remote_status: Some("SucceededPartial".into()),
            done: true,
            number_components_deployed: Some(1),
            number_components_total: Some(2),
        };
        let value = ToolResponse::success(Some("create_apex_class"))
            .with_outcome(&outcome)
            .into_value();

        assert_eq!(value["success"], true);
        assert_eq!(value["status"], "PartiallySucceeded");
        assert_eq!(value["errors"]["componentFailures"][0]["problem"], "unused variable");
    }
}
