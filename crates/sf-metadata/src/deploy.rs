//! Deploy requests, remote results and the terminal outcome of a deployment.

use serde::{Deserialize, Deserializer, Serialize};

use crate::package::PackageManifest;
use crate::types::{TestLevel, MANIFEST_PATH};

/// Whether a deployment is a dry run or applies changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployMode {
    ValidateOnly,
    Commit,
}

impl DeployMode {
    pub fn is_check_only(&self) -> bool {
        matches!(self, DeployMode::ValidateOnly)
    }
}

/// Options sent with a deploy request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    /// Validate only, don't actually deploy.
    pub check_only: bool,
    /// Rollback all changes if any component fails.
    pub rollback_on_error: bool,
    pub single_package: bool,
    pub test_level: TestLevel,
    pub ignore_warnings: bool,
    /// Specific tests to run (when test_level is RunSpecifiedTests).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub run_tests: Vec<String>,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            check_only: false,
            rollback_on_error: true,
            single_package: true,
            test_level: TestLevel::NoTestRun,
            ignore_warnings: false,
            run_tests: Vec::new(),
        }
    }
}

impl DeployOptions {
    pub fn for_mode(mode: DeployMode) -> Self {
        Self {
            check_only: mode.is_check_only(),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> DeployMode {
        if self.check_only {
            DeployMode::ValidateOnly
        } else {
            DeployMode::Commit
        }
    }
}

/// The `json` part of a deploy request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeployRequestBody<'a> {
    pub deploy_options: &'a DeployOptions,
}

/// Body returned when a deploy request is accepted.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeployRequestResponse {
    #[serde(default)]
    pub id: Option<String>,
}

/// A submitted deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployJob {
    pub id: String,
    pub mode: DeployMode,
    /// Manifest of the package that was submitted.
    pub manifest: PackageManifest,
}

/// Body of a deploy status request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployStatusResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub deploy_result: DeployResult,
}

/// Remote view of a deployment, as reported by `deployRequest/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployResult {
    pub id: Option<String>,
    pub done: bool,
    pub status: Option<String>,
    pub success: Option<bool>,
    pub error_message: Option<String>,
    pub error_status_code: Option<String>,
    pub state_detail: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub number_components_deployed: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub number_component_errors: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub number_components_total: Option<u32>,
    pub details: Option<DeployDetails>,
}

impl DeployResult {
    pub fn component_failures(&self) -> &[ComponentFailure] {
        self.details
            .as_ref()
            .map(|d| d.component_failures.as_slice())
            .unwrap_or_default()
    }

    pub fn component_successes(&self) -> &[ComponentSuccess] {
        self.details
            .as_ref()
            .map(|d| d.component_successes.as_slice())
            .unwrap_or_default()
    }
}

/// Per-component details. Each list may arrive as a single object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployDetails {
    #[serde(deserialize_with = "one_or_many")]
    pub component_failures: Vec<ComponentFailure>,
    #[serde(deserialize_with = "one_or_many")]
    pub component_successes: Vec<ComponentSuccess>,
}

/// A component failure in deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub line_number: Option<u32>,
    #[serde(
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub column_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    pub created: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentSuccess {
    pub component_type: Option<String>,
    pub file_name: Option<String>,
    pub full_name: Option<String>,
    pub created: bool,
    pub changed: bool,
    pub deleted: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
    })
}

/// Counters occasionally arrive as strings.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Num(u32),
        Str(String),
    }

    Ok(match Option::<NumOrString>::deserialize(deserializer)? {
        Some(NumOrString::Num(n)) => Some(n),
        Some(NumOrString::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Lifecycle state of a deployment as seen by the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployState {
    Pending,
    InProgress,
    Succeeded,
    /// Succeeded with warnings or partially applied components.
    PartiallySucceeded,
    Failed,
    TimedOut,
}

impl DeployState {
    /// Map a remote status literal.
    pub fn from_remote(status: Option<&str>, done: bool) -> Self {
        match status {
            Some("Pending") => DeployState::Pending,
            Some("InProgress") | Some("Canceling") => DeployState::InProgress,
            Some("Succeeded") => DeployState::Succeeded,
            Some("SucceededPartial") => DeployState::PartiallySucceeded,
            Some("Failed") | Some("Canceled") => DeployState::Failed,
            Some(_) | None if done => DeployState::Failed,
            Some(_) => DeployState::InProgress,
            None => DeployState::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeployState::Pending | DeployState::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeployState::Succeeded | DeployState::PartiallySucceeded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeployState::Pending => "Pending",
            DeployState::InProgress => "InProgress",
            DeployState::Succeeded => "Succeeded",
            DeployState::PartiallySucceeded => "PartiallySucceeded",
            DeployState::Failed => "Failed",
            DeployState::TimedOut => "TimedOut",
        }
    }
}

impl std::fmt::Display for DeployState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome for one component of a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentResult {
    pub component_name: String,
    pub component_kind: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl ComponentResult {
    fn from_failure(failure: &ComponentFailure) -> Self {
        Self {
            component_name: failure
                .full_name
                .clone()
                .or_else(|| failure.file_name.clone())
                .unwrap_or_default(),
            component_kind: failure.component_type.clone().unwrap_or_default(),
            success: false,
            message: failure.problem.clone(),
            line: failure.line_number,
            column: failure.column_number,
        }
    }

    fn from_success(success: &ComponentSuccess) -> Self {
        Self {
            component_name: success
                .full_name
                .clone()
                .or_else(|| success.file_name.clone())
                .unwrap_or_default(),
            component_kind: success.component_type.clone().unwrap_or_default(),
            success: true,
            message: None,
            line: None,
            column: None,
        }
    }

    /// Deployment-level failure with no component attribution.
    fn deployment_failure(message: impl Into<String>) -> Self {
        Self {
            component_name: "deployment".to_string(),
            component_kind: String::new(),
            success: false,
            message: Some(message.into()),
            line: None,
            column: None,
        }
    }

    fn is_manifest(success: &ComponentSuccess) -> bool {
        success.full_name.as_deref() == Some(MANIFEST_PATH)
            || success.file_name.as_deref() == Some(MANIFEST_PATH)
            || success.file_name.as_deref().is_some_and(|f| f.ends_with("/package.xml"))
    }
}

/// What the poller reports for a deployment.
///
/// `Succeeded` never carries a failed component. `Failed` and `TimedOut`
/// always carry at least one failure unless no status was ever observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    pub state: DeployState,
    pub job_id: String,
    /// Failures first, in reported order, then successes.
    pub component_results: Vec<ComponentResult>,
    /// Raw failures as the platform reported them.
    pub component_failures: Vec<ComponentFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Last remote status literal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_status: Option<String>,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_components_deployed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_components_total: Option<u32>,
}

impl DeployOutcome {
    pub fn from_result(job_id: impl Into<String>, result: &DeployResult) -> Self {
        let failures = result.component_failures().to_vec();
        let mut state = DeployState::from_remote(result.status.as_deref(), result.done);

        if result.status.is_none() && (result.error_message.is_some() || !failures.is_empty()) {
            state = DeployState::Failed;
        }
        if state == DeployState::Succeeded && !failures.is_empty() {
            state = DeployState::PartiallySucceeded;
        }

        let mut component_results: Vec<ComponentResult> =
            failures.iter().map(ComponentResult::from_failure).collect();
        component_results.extend(
            result
                .component_successes()
                .iter()
                .filter(|s| !ComponentResult::is_manifest(s))
                .map(ComponentResult::from_success),
        );

        if state == DeployState::Failed && failures.is_empty() {
            let message = result
                .error_message
                .clone()
                .unwrap_or_else(|| "Deployment failed without component diagnostics".to_string());
            component_results.insert(0, ComponentResult::deployment_failure(message));
        }

        Self {
            state,
            job_id: job_id.into(),
            component_results,
            component_failures: failures,
            error_message: result.error_message.clone(),
            remote_status: result.status.clone(),
            done: result.done,
            number_components_deployed: result.number_components_deployed,
            number_components_total: result.number_components_total,
        }
    }

    /// The deadline passed; keeps whatever was last observed.
    pub fn timed_out(job_id: impl Into<String>, last: Option<DeployOutcome>) -> Self {
        let job_id = job_id.into();
        match last {
            Some(last) => Self {
                state: DeployState::TimedOut,
                job_id,
                done: false,
                ..last
            },
            None => Self {
                state: DeployState::TimedOut,
                job_id,
                component_results: Vec::new(),
                component_failures: Vec::new(),
                error_message: None,
                remote_status: None,
                done: false,
                number_components_deployed: None,
                number_components_total: None,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.state.is_success()
    }

    /// Human-readable failure summary.
    pub fn failure_summary(&self) -> Option<String> {
        let problems: Vec<String> = self
            .component_results
            .iter()
            .filter(|r| !r.success)
            .map(|r| match (&r.message, r.component_name.is_empty()) {
                (Some(m), false) => format!("{}: {}", r.component_name, m),
                (Some(m), true) => m.clone(),
                (None, _) => r.component_name.clone(),
            })
            .collect();
        if problems.is_empty() {
            self.error_message.clone()
        } else {
            Some(problems.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(value: serde_json::Value) -> DeployResult {
        serde_json::from_value::<DeployStatusResponse>(json!({ "deployResult": value }))
            .unwrap()
            .deploy_result
    }

    #[test]
    fn test_deploy_options_serialization() {
        let value = serde_json::to_value(DeployRequestBody {
            deploy_options: &DeployOptions::for_mode(DeployMode::ValidateOnly),
        })
        .unwrap();

        assert_eq!(
            value,
            json!({
                "deployOptions": {
                    "checkOnly": true,
                    "rollbackOnError": true,
                    "singlePackage": true,
                    "testLevel": "NoTestRun",
                    "ignoreWarnings": false
                }
            })
        );

        let mut options = DeployOptions::for_mode(DeployMode::Commit);
        options.test_level = TestLevel::RunSpecifiedTests;
        options.run_tests = vec!["GreeterTest".into()];
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["checkOnly"], false);
        assert_eq!(value["runTests"], json!(["GreeterTest"]));
        assert_eq!(options.mode(), DeployMode::Commit);
    }

    #[test]
    fn test_status_mapping() {
        use DeployState::*;
        let cases = [
            (Some("Pending"), false, Pending),
            (Some("InProgress"), false, InProgress),
            (Some("Canceling"), false, InProgress),
            (Some("Succeeded"), true, Succeeded),
            (Some("SucceededPartial"), true, PartiallySucceeded),
            (Some("Failed"), true, Failed),
            (Some("Canceled"), true, Failed),
            (Some("Mystery"), true, Failed),
            (Some("Mystery"), false, InProgress),
            (None, false, Pending),
            (None, true, Failed),
        ];
        for (status, done, expected) in cases {
            assert_eq!(DeployState::from_remote(status, done), expected, "{status:?}");
        }
    }

    #[test]
    fn test_single_failure_object_accepted() {
        let r = result(json!({
            "id": "0Af000000000001AAA",
            "done": true,
            "status": "Failed",
            "success": false,
            "details": {
                "componentFailures": {
                    "componentType": "CustomField",
                    "fullName": "Account.Tier__c",
                    "problem": "bad value for restricted picklist",
                    "problemType": "Error",
                    "lineNumber": "4"
                }
            }
        }));

        assert_eq!(r.component_failures().len(), 1);
        assert_eq!(r.component_failures()[0].line_number, Some(4));

        let outcome = DeployOutcome::from_result("0Af000000000001AAA", &r);
        assert_eq!(outcome.state, DeployState::Failed);
        assert_eq!(outcome.component_results.len(), 1);
        assert_eq!(outcome.component_results[0].component_name, "Account.Tier__c");
        assert!(!outcome.component_results[0].success);
    }

    #[test]
    fn test_failures_precede_successes_and_manifest_excluded() {
        let r = result(json!({
            "done": true,
            "status": "SucceededPartial",
            "numberComponentsDeployed": 1,
            "numberComponentsTotal": 2,
            "details": {
                "componentFailures": [
                    {"componentType": "ApexClass", "fullName": "Broken", "problem": "Unexpected token", "lineNumber": 3, "columnNumber": 7}
                ],
                "componentSuccesses": [
                    {"componentType": "", "fullName": "package.xml", "fileName": "package.xml"},
                    {"componentType": "ApexClass", "fullName": "Greeter", "created": true}
                ]
            }
        }));

        let outcome = DeployOutcome::from_result("job", &r);
        assert_eq!(outcome.state, DeployState::PartiallySucceeded);
        assert!(outcome.is_success());
        let names: Vec<_> = outcome
            .component_results
            .iter()
            .map(|c| (c.component_name.as_str(), c.success))
            .collect();
        assert_eq!(names, vec![("Broken", false), ("Greeter", true)]);
        assert_eq!(outcome.component_results[0].line, Some(3));
        assert_eq!(outcome.number_components_total, Some(2));
    }

    #[test]
    fn test_succeeded_with_failures_is_partial() {
        let r = result(json!({
            "done": true,
            "status": "Succeeded",
            "details": {"componentFailures": [{"fullName": "X", "problem": "warning"}]}
        }));
        assert_eq!(
            DeployOutcome::from_result("job", &r).state,
            DeployState::PartiallySucceeded
        );
    }

    #[test]
    fn test_missing_status_with_error_is_failed() {
        let r = result(json!({"done": false, "errorMessage": "INVALID_CROSS_REFERENCE_KEY"}));
        let outcome = DeployOutcome::from_result("job", &r);
        assert_eq!(outcome.state, DeployState::Failed);
        assert_eq!(
            outcome.failure_summary().as_deref(),
            Some("deployment: INVALID_CROSS_REFERENCE_KEY")
        );
    }

    #[test]
    fn test_failed_without_components_gets_diagnostic() {
        let r = result(json!({"done": true, "status": "Failed"}));
        let outcome = DeployOutcome::from_result("job", &r);
        assert_eq!(outcome.component_results.len(), 1);
        assert!(!outcome.component_results[0].success);
    }

    #[test]
    fn test_null_details_tolerated() {
        let r = result(json!({"done": false, "status": "InProgress", "details": null}));
        assert!(r.component_failures().is_empty());
        let r = result(json!({
            "done": false,
            "status": "InProgress",
            "details": {"componentFailures": null, "componentSuccesses": []}
        }));
        assert!(r.component_successes().is_empty());
    }

    #[test]
    fn test_timed_out_keeps_last_counters() {
        let r = result(json!({
            "done": false,
            "status": "InProgress",
            "numberComponentsDeployed": 3,
            "numberComponentsTotal": 5
        }));
        let last = DeployOutcome::from_result("job", &r);
        let outcome = DeployOutcome::timed_out("job", Some(last));
        assert_eq!(outcome.state, DeployState::TimedOut);
        assert_eq!(outcome.number_components_deployed, Some(3));
        assert_eq!(outcome.remote_status.as_deref(), Some("InProgress"));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_failure_serializes_camel_case() {
        let failure = ComponentFailure {
            component_type: Some("CustomField".into()),
            full_name: Some("Account.Tier__c".into()),
            problem: Some("bad".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["componentType"], "CustomField");
        assert_eq!(value["fullName"], "Account.Tier__c");
        assert!(value.get("lineNumber").is_none());
    }
}
