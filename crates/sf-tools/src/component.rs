//! Lightning web component bundle create and update.

use busbar_sf_client::security::soql;
use busbar_sf_metadata::descriptor::{default_html, default_js};
use busbar_sf_metadata::{ComponentDescriptor, DeployMode, DeployPackage, PackageBuilder};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::{QueryScope, ToolContext};
use crate::envelope::ToolResponse;
use crate::error::{Error, Result};
use crate::pipeline::{self, Precondition};
use crate::registry::{invoke, ToolArgs, ToolDefinition, ToolHandler};

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentArgs {
    pub component_name: String,
    #[serde(default, alias = "html_content")]
    pub html: Option<String>,
    #[serde(default, alias = "js_content")]
    pub js: Option<String>,
    #[serde(default, alias = "css_content")]
    pub css: Option<String>,
    #[serde(default)]
    pub svg: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub master_label: Option<String>,
    #[serde(default)]
    pub is_exposed: bool,
    #[serde(default)]
    pub targets: Vec<String>,
}

impl ToolArgs for ComponentArgs {
    fn identifiers(&self) -> Vec<(&'static str, String)> {
        vec![("component_name", self.component_name.clone())]
    }
}

impl ComponentArgs {
    /// Missing templates fall back to the starter bundle when `defaults`
    /// is set, and are an error otherwise.
    fn descriptor(&self, defaults: bool) -> Result<ComponentDescriptor> {
        let name = self.component_name.as_str();
        let html = match (&self.html, defaults) {
            (Some(html), _) => html.clone(),
            (None, true) => default_html(name),
            (None, false) => return Err(Error::validation("html is required when updating a bundle")),
        };
        let js = match (&self.js, defaults) {
            (Some(js), _) => js.clone(),
            (None, true) => default_js(name),
            (None, false) => return Err(Error::validation("js is required when updating a bundle")),
        };

        let mut component = ComponentDescriptor::new(name, html, js)?;
        component.css = self.css.clone().filter(|c| !c.is_empty());
        component.svg = self.svg.clone().filter(|s| !s.is_empty());
        component.description = self.description.clone();
        component.master_label = self.master_label.clone();
        component.is_exposed = self.is_exposed;
        component.targets = self.targets.clone();
        Ok(component)
    }
}

fn input_schema(templates_required: bool) -> Value {
    let required = if templates_required {
        json!(["component_name", "html", "js"])
    } else {
        json!(["component_name"])
    };
    json!({
        "type": "object",
        "properties": {
            "component_name": {"type": "string", "description": "Bundle name in camelCase, starting with a lowercase letter"},
            "html": {"type": "string", "description": "Template markup"},
            "js": {"type": "string", "description": "Controller module source"},
            "css": {"type": "string"},
            "svg": {"type": "string", "description": "Custom icon"},
            "description": {"type": "string"},
            "master_label": {"type": "string"},
            "is_exposed": {"type": "boolean", "description": "Make the bundle available in the App Builder"},
            "targets": {"type": "array", "items": {"type": "string"}, "description": "App Builder targets for exposed bundles"}
        },
        "required": required
    })
}

fn bundle_query(name: &str) -> String {
    format!(
        "SELECT Id, DeveloperName FROM LightningComponentBundle WHERE DeveloperName = '{}'",
        soql::escape_string(name)
    )
}

fn package(component: &ComponentDescriptor, version: &str) -> Result<DeployPackage> {
    Ok(PackageBuilder::new(version).descriptor(component)?.build()?)
}

async fn deploy_component(
    ctx: &ToolContext,
    component: ComponentDescriptor,
    precondition: Precondition,
    operation: &str,
    verb: &str,
) -> Result<ToolResponse> {
    let package = package(&component, &ctx.config().api_version)?;

    let conn = ctx.connect().await?;
    pipeline::check_existence(
        &conn,
        QueryScope::Tooling,
        &bundle_query(component.name()),
        precondition,
        &format!("Component '{}'", component.name()),
    )
    .await?;

    let outcome = pipeline::deploy(&conn, &package, DeployMode::Commit).await?;
    Ok(ToolResponse::success(Some(operation))
        .with("component_name", component.name())
        .with("api_version", package.version())
        .with("files", package.paths())
        .with_outcome(&outcome)
        .with(
            "message",
            format!("Successfully {verb} component '{}'", component.name()),
        ))
}

pub async fn create_lwc_component(ctx: &ToolContext, args: ComponentArgs) -> Result<ToolResponse> {
    let component = args.descriptor(true)?;
    deploy_component(ctx, component, Precondition::Absent, "create_lwc_component", "created").await
}

pub async fn update_lwc_component(ctx: &ToolContext, args: ComponentArgs) -> Result<ToolResponse> {
    let component = args.descriptor(false)?;
    deploy_component(ctx, component, Precondition::Present, "update_lwc_component", "updated").await
}

pub struct CreateLwcComponent;

impl ToolHandler for CreateLwcComponent {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "create_lwc_component",
            "Create a Lightning web component bundle. Missing html or js files are filled \
             with a starter template.",
            input_schema(false),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("create_lwc_component", args, move |a| {
            create_lwc_component(ctx, a)
        }))
    }
}

pub struct UpdateLwcComponent;

impl ToolHandler for UpdateLwcComponent {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "update_lwc_component",
            "Replace the files of an existing Lightning web component bundle.",
            input_schema(true),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("update_lwc_component", args, move |a| {
            update_lwc_component(ctx, a)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: Value) -> ComponentArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_fills_default_templates() {
        let component = args(json!({"component_name": "invoiceCard"}))
            .descriptor(true)
            .unwrap();
        assert!(component.html.contains("Hello from invoiceCard!"));
        assert!(component.js.contains("class InvoiceCard extends LightningElement"));
        assert!(!component.is_exposed);

        let package = package(&component, "62.0").unwrap();
        assert_eq!(
            package.paths(),
            vec![
                "lwc/invoiceCard/invoiceCard.html",
                "lwc/invoiceCard/invoiceCard.js",
                "lwc/invoiceCard/invoiceCard.js-meta.xml",
            ]
        );
    }

    #[test]
    fn test_update_requires_templates() {
        let err = args(json!({"component_name": "invoiceCard", "html": "<template></template>"}))
            .descriptor(false)
            .unwrap_err();
        assert!(matches!(err.kind, crate::ErrorKind::Validation(_)));
    }

    #[test]
    fn test_legacy_argument_names() {
        let component = args(json!({
            "component_name": "invoiceCard",
            "html_content": "<template><p>hi</p></template>",
            "js_content": "export default class InvoiceCard {}",
            "css_content": ""
        }))
        .descriptor(false)
        .unwrap();
        assert_eq!(component.html, "<template><p>hi</p></template>");
        assert!(component.css.is_none());
    }

    #[test]
    fn test_bad_bundle_name() {
        let err = args(json!({"component_name": "Invoice-Card"}))
            .descriptor(true)
            .unwrap_err();
        assert!(matches!(err.kind, crate::ErrorKind::Validation(_)));
    }
}
