//! Tool definitions and the name → handler registry.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::context::ToolContext;
use crate::envelope::ToolResponse;
use crate::error::{Error, Result};

/// What `tools/list` reports for one tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A callable tool. Handlers never fail: every error is folded into the
/// response envelope.
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse>;
}

/// Typed tool arguments.
pub(crate) trait ToolArgs: DeserializeOwned {
    /// Entity identifiers echoed into every response, including failures.
    fn identifiers(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

/// Parse arguments, run the tool, and fold errors into the envelope. The
/// tool name is the envelope's `operation`.
pub(crate) async fn invoke<A, F, Fut>(tool: &str, args: Value, run: F) -> ToolResponse
where
    A: ToolArgs,
    F: FnOnce(A) -> Fut,
    Fut: Future<Output = Result<ToolResponse>>,
{
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    let parsed: A = match serde_json::from_value(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            let err = Error::validation(format!("invalid arguments for {tool}: {e}"));
            return ToolResponse::from_error(Some(tool), &err);
        }
    };

    let identifiers = parsed.identifiers();
    let response = match run(parsed).await {
        Ok(response) => {
            info!(tool, success = response.is_success(), "Tool finished");
            response
        }
        Err(err) => {
            warn!(tool, error = %err, kind = err.error_type(), "Tool failed");
            ToolResponse::from_error(Some(tool), &err)
        }
    };

    identifiers
        .into_iter()
        .fold(response, |response, (key, value)| response.with_default(key, value))
}

/// Static table of tools keyed by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tool this crate provides.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(crate::apex::CreateApexClass);
        registry.register(crate::apex::UpdateApexClass);
        registry.register(crate::field::CreateCustomField);
        registry.register(crate::field::UpdateCustomField);
        registry.register(crate::object::CreateCustomObject);
        registry.register(crate::object::UpdateCustomObject);
        registry.register(crate::component::CreateLwcComponent);
        registry.register(crate::component::UpdateLwcComponent);
        registry.register(crate::query::ExecuteSoqlQuery);
        registry.register(crate::status::GetMetadataDeployStatus);
        registry.register(crate::auth::AuthStatus);
        registry.register(crate::auth::Logout);
        registry
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) {
        let name = handler.definition().name;
        self.tools.insert(name, Arc::new(handler));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.tools.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name. `None` when no such tool is registered.
    pub async fn call(&self, ctx: &ToolContext, name: &str, args: Value) -> Option<ToolResponse> {
        let handler = self.tools.get(name)?;
        Some(handler.call(ctx, args).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use busbar_sf_auth::SessionStore;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct EchoArgs {
        name: String,
    }

    impl ToolArgs for EchoArgs {
        fn identifiers(&self) -> Vec<(&'static str, String)> {
            vec![("name", self.name.clone())]
        }
    }

    fn context() -> ToolContext {
        ToolContext::new(Arc::new(SessionStore::new()), ServerConfig::default())
    }

    #[test]
    fn test_builtin_tools() {
        let registry = ToolRegistry::builtin();
        assert_eq!(registry.len(), 12);
        for name in [
            "create_apex_class",
            "update_apex_class",
            "create_custom_field",
            "update_custom_field",
            "create_custom_object",
            "update_custom_object",
            "create_lwc_component",
            "update_lwc_component",
            "execute_soql_query",
            "get_metadata_deploy_status",
            "salesforce_auth_status",
            "salesforce_logout",
        ] {
            assert!(registry.get(name).is_some(), "missing {name}");
        }

        for definition in registry.definitions() {
            assert_eq!(definition.input_schema["type"], "object", "{}", definition.name);
            assert!(!definition.description.is_empty());
        }
    }

    #[tokio::test]
    async fn test_invoke_rejects_malformed_arguments() {
        let response = invoke("echo", json!({"name": 42}), |_: EchoArgs| async {
            Ok(ToolResponse::success(Some("echo")))
        })
        .await;

        assert!(!response.is_success());
        assert_eq!(response.get("error_type"), Some(&json!("ValidationError")));
    }

    #[tokio::test]
    async fn test_invoke_echoes_identifiers_on_failure() {
        let response = invoke("echo", json!({"name": "Greeter"}), |_: EchoArgs| async {
            Err(Error::validation("nope"))
        })
        .await;

        assert!(!response.is_success());
        assert_eq!(response.get("name"), Some(&json!("Greeter")));
        assert_eq!(response.get("operation"), Some(&json!("echo")));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::builtin();
        assert!(registry
            .call(&context(), "drop_database", json!({}))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_org_tools_require_a_session() {
        let registry = ToolRegistry::builtin();
        let response = registry
            .call(
                &context(),
                "execute_soql_query",
                json!({"query": "SELECT Id FROM Account"}),
            )
            .await
            .unwrap();

        assert!(!response.is_success());
        assert_eq!(response.get("error_type"), Some(&json!("NotAuthenticated")));
    }
}
