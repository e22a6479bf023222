//! Apex class create and update.

use busbar_sf_client::security::soql;
use busbar_sf_metadata::{ApexClassDescriptor, DeployMode, DeployPackage, PackageBuilder};
use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::context::{Connection, QueryScope, ToolContext};
use crate::envelope::ToolResponse;
use crate::error::Result;
use crate::pipeline::{self, Precondition};
use crate::registry::{invoke, ToolArgs, ToolDefinition, ToolHandler};

#[derive(Debug, Clone, Deserialize)]
pub struct ApexClassArgs {
    pub class_name: String,
    #[serde(alias = "content")]
    pub body: String,
    #[serde(default)]
    pub api_version: Option<String>,
}

impl ToolArgs for ApexClassArgs {
    fn identifiers(&self) -> Vec<(&'static str, String)> {
        vec![("class_name", self.class_name.clone())]
    }
}

fn input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "class_name": {
                "type": "string",
                "description": "Class name: letters, digits and single underscores, starting with a letter"
            },
            "body": {"type": "string", "description": "Complete Apex source of the class"},
            "api_version": {"type": "string", "description": "API version for the class, e.g. 62.0"}
        },
        "required": ["class_name", "body"]
    })
}

fn class_query(name: &str) -> String {
    format!(
        "SELECT Id, Name, ApiVersion FROM ApexClass WHERE Name = '{}' AND NamespacePrefix = null",
        soql::escape_string(name)
    )
}

fn package(descriptor: &ApexClassDescriptor, version: &str) -> Result<DeployPackage> {
    Ok(PackageBuilder::new(version).descriptor(descriptor)?.build()?)
}

async fn deploy_class(
    conn: &Connection,
    descriptor: &ApexClassDescriptor,
    package: &DeployPackage,
    operation: &str,
    verb: &str,
) -> Result<ToolResponse> {
    let outcome = pipeline::deploy(conn, package, DeployMode::Commit).await?;
    let api_version = descriptor
        .api_version
        .clone()
        .unwrap_or_else(|| package.version().to_string());

    Ok(ToolResponse::success(Some(operation))
        .with("class_name", descriptor.name())
        .with("api_version", api_version)
        .with("files", package.paths())
        .with_outcome(&outcome)
        .with(
            "message",
            format!("Successfully {verb} Apex class '{}'", descriptor.name()),
        ))
}

pub async fn create_apex_class(ctx: &ToolContext, args: ApexClassArgs) -> Result<ToolResponse> {
    let mut descriptor = ApexClassDescriptor::new(&args.class_name, args.body)?;
    if let Some(version) = args.api_version {
        descriptor = descriptor.with_api_version(version);
    }
    let package = package(&descriptor, &ctx.config().api_version)?;

    let conn = ctx.connect().await?;
    pipeline::check_existence(
        &conn,
        QueryScope::Rest,
        &class_query(descriptor.name()),
        Precondition::Absent,
        &format!("Apex class '{}'", descriptor.name()),
    )
    .await?;

    deploy_class(&conn, &descriptor, &package, "create_apex_class", "created").await
}

/// Replaces the class body. Keeps the existing class's API version unless
/// one is given.
pub async fn update_apex_class(ctx: &ToolContext, args: ApexClassArgs) -> Result<ToolResponse> {
    let descriptor = ApexClassDescriptor::new(&args.class_name, args.body)?;
    package(&descriptor, &ctx.config().api_version)?;

    let conn = ctx.connect().await?;
    let existing = pipeline::check_existence(
        &conn,
        QueryScope::Rest,
        &class_query(descriptor.name()),
        Precondition::Present,
        &format!("Apex class '{}'", descriptor.name()),
    )
    .await?;

    let version = args
        .api_version
        .or_else(|| existing.as_ref().and_then(pipeline::record_api_version))
        .unwrap_or_else(|| ctx.config().api_version.clone());
    let descriptor = descriptor.with_api_version(version);
    let package = package(&descriptor, &ctx.config().api_version)?;

    deploy_class(&conn, &descriptor, &package, "update_apex_class", "updated").await
}

pub struct CreateApexClass;

impl ToolHandler for CreateApexClass {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "create_apex_class",
            "Create a new Apex class and deploy it. Fails if a class with the same name exists.",
            input_schema(),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("create_apex_class", args, move |a| {
            create_apex_class(ctx, a)
        }))
    }
}

pub struct UpdateApexClass;

impl ToolHandler for UpdateApexClass {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "update_apex_class",
            "Replace the source of an existing Apex class and deploy it.",
            input_schema(),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("update_apex_class", args, move |a| {
            update_apex_class(ctx, a)
        }))
    }
}
