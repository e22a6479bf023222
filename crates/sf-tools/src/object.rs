//! Custom object create and update.

use busbar_sf_client::security::soql;
use busbar_sf_metadata::descriptor::{DeploymentStatus, NameFieldType, SharingModel};
use busbar_sf_metadata::{DeployMode, DeployPackage, ObjectDescriptor, PackageBuilder};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::{QueryScope, ToolContext};
use crate::envelope::ToolResponse;
use crate::error::Result;
use crate::pipeline::{self, Precondition};
use crate::registry::{invoke, ToolArgs, ToolDefinition, ToolHandler};

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectArgs {
    pub object_name: String,
    pub label: String,
    pub plural_label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name_field_label: Option<String>,
    #[serde(default)]
    pub name_field_type: Option<NameFieldType>,
    #[serde(default)]
    pub display_format: Option<String>,
    #[serde(default)]
    pub sharing_model: Option<SharingModel>,
    #[serde(default)]
    pub deployment_status: Option<DeploymentStatus>,
    #[serde(default)]
    pub enable_activities: Option<bool>,
    #[serde(default)]
    pub enable_reports: Option<bool>,
    #[serde(default)]
    pub enable_search: Option<bool>,
}

impl ToolArgs for ObjectArgs {
    fn identifiers(&self) -> Vec<(&'static str, String)> {
        vec![("object_name", self.object_name.clone())]
    }
}

impl ObjectArgs {
    fn descriptor(&self) -> Result<ObjectDescriptor> {
        let mut object = ObjectDescriptor::new(&self.object_name, &self.label, &self.plural_label)?;
        object.description = self.description.clone();
        object.name_field_label = self.name_field_label.clone();
        object.display_format = self.display_format.clone();
        if let Some(name_field_type) = self.name_field_type {
            object.name_field_type = name_field_type;
        }
        if let Some(sharing_model) = self.sharing_model {
            object.sharing_model = sharing_model;
        }
        if let Some(status) = self.deployment_status {
            object.deployment_status = status;
        }
        object.enable_activities = self.enable_activities.unwrap_or(object.enable_activities);
        object.enable_reports = self.enable_reports.unwrap_or(object.enable_reports);
        object.enable_search = self.enable_search.unwrap_or(object.enable_search);
        Ok(object)
    }
}

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "object_name": {"type": "string", "description": "Object API name; __c is appended when missing"},
            "label": {"type": "string"},
            "plural_label": {"type": "string"},
            "description": {"type": "string"},
            "name_field_label": {"type": "string", "description": "Defaults to '<label> Name'"},
            "name_field_type": {"type": "string", "enum": ["Text", "AutoNumber"]},
            "display_format": {"type": "string", "description": "AutoNumber format, e.g. INV-{0000}"},
            "sharing_model": {"type": "string", "enum": ["Private", "Read", "ReadWrite", "ControlledByParent"]},
            "deployment_status": {"type": "string", "enum": ["Deployed", "InDevelopment"]},
            "enable_activities": {"type": "boolean"},
            "enable_reports": {"type": "boolean"},
            "enable_search": {"type": "boolean"}
        },
        "required": ["object_name", "label", "plural_label"]
    })
}

fn object_query(name: &str) -> String {
    format!(
        "SELECT DurableId, QualifiedApiName FROM EntityDefinition WHERE QualifiedApiName = '{}'",
        soql::escape_string(name)
    )
}

fn package(object: &ObjectDescriptor, version: &str) -> Result<DeployPackage> {
    Ok(PackageBuilder::new(version).descriptor(object)?.build()?)
}

async fn deploy_object(
    ctx: &ToolContext,
    args: ObjectArgs,
    precondition: Precondition,
    operation: &str,
    verb: &str,
) -> Result<ToolResponse> {
    let object = args.descriptor()?;
    let package = package(&object, &ctx.config().api_version)?;

    let conn = ctx.connect().await?;
    pipeline::check_existence(
        &conn,
        QueryScope::Tooling,
        &object_query(object.object_name()),
        precondition,
        &format!("Object '{}'", object.object_name()),
    )
    .await?;

    let outcome = pipeline::deploy(&conn, &package, DeployMode::Commit).await?;
    Ok(ToolResponse::success(Some(operation))
        .with("object_name", object.object_name())
        .with("label", &object.label)
        .with_outcome(&outcome)
        .with(
            "message",
            format!("Successfully {verb} object '{}'", object.object_name()),
        ))
}

pub async fn create_custom_object(ctx: &ToolContext, args: ObjectArgs) -> Result<ToolResponse> {
    deploy_object(ctx, args, Precondition::Absent, "create_custom_object", "created").await
}

/// Redeploys the whole object definition from the given attributes.
pub async fn update_custom_object(ctx: &ToolContext, args: ObjectArgs) -> Result<ToolResponse> {
    deploy_object(ctx, args, Precondition::Present, "update_custom_object", "updated").await
}

pub struct CreateCustomObject;

impl ToolHandler for CreateCustomObject {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "create_custom_object",
            "Create a custom object with its name field and sharing settings.",
            input_schema(),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("create_custom_object", args, move |a| {
            create_custom_object(ctx, a)
        }))
    }
}

pub struct UpdateCustomObject;

impl ToolHandler for UpdateCustomObject {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "update_custom_object",
            "Redeploy an existing custom object definition.",
            input_schema(),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("update_custom_object", args, move |a| {
            update_custom_object(ctx, a)
        }))
    }
}
