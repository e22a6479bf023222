//! Custom field create and update.
//!
//! Creating a field deploys twice: a validate-only pass first, so a field
//! the platform would reject never touches the org, then the real deploy.
//! A successful create is followed by a best-effort grant of read and edit
//! access on the new field.

use busbar_sf_client::security::soql;
use busbar_sf_metadata::{
    DeployMode, DeployPackage, FieldDescriptor, FieldType, PackageBuilder,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::context::{Connection, QueryScope, ToolContext};
use crate::envelope::ToolResponse;
use crate::error::{ErrorKind, Result};
use crate::pipeline::{self, Precondition};
use crate::registry::{invoke, ToolArgs, ToolDefinition, ToolHandler};

/// Profile whose owned permission set receives new field access by default.
const ADMIN_PROFILE: &str = "System Administrator";

#[derive(Debug, Clone, Deserialize)]
pub struct FieldArgs {
    pub object_name: String,
    pub field_name: String,
    pub label: String,
    #[serde(default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub external_id: bool,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub visible_lines: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub picklist_values: Vec<String>,
    #[serde(default)]
    pub reference_to: Option<String>,
    #[serde(default)]
    pub relationship_label: Option<String>,
    #[serde(default)]
    pub relationship_name: Option<String>,
}

fn default_field_type() -> String {
    FieldType::Text.as_str().to_string()
}

impl ToolArgs for FieldArgs {
    fn identifiers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("object_name", self.object_name.clone()),
            ("field_name", self.field_name.clone()),
            ("field_type", self.field_type.clone()),
        ]
    }
}

impl FieldArgs {
    fn descriptor(&self) -> Result<FieldDescriptor> {
        let field_type: FieldType = self.field_type.parse()?;
        let mut field =
            FieldDescriptor::new(&self.object_name, &self.field_name, &self.label, field_type)?;
        field.description = self.description.clone();
        field.required = self.required;
        field.unique = self.unique;
        field.external_id = self.external_id;
        field.length = self.length;
        field.visible_lines = self.visible_lines;
        field.precision = self.precision;
        field.scale = self.scale;
        field.default_value = self.default_value.clone();
        field.picklist_values = self.picklist_values.clone();
        field.reference_to = self.reference_to.clone();
        field.relationship_label = self.relationship_label.clone();
        field.relationship_name = self.relationship_name.clone();
        Ok(field)
    }
}

fn input_schema() -> Value {
    let types: Vec<&str> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "object_name": {"type": "string", "description": "Parent object, e.g. Account or Invoice__c"},
            "field_name": {"type": "string", "description": "Field API name; __c is appended when missing"},
            "label": {"type": "string"},
            "field_type": {"type": "string", "enum": types, "default": "Text"},
            "description": {"type": "string"},
            "required": {"type": "boolean"},
            "unique": {"type": "boolean"},
            "external_id": {"type": "boolean"},
            "length": {"type": "integer", "description": "Text: 1-255, LongTextArea: 256-131072"},
            "visible_lines": {"type": "integer"},
            "precision": {"type": "integer", "description": "Total digits for numeric fields, 1-18"},
            "scale": {"type": "integer", "description": "Decimal places, at most precision"},
            "default_value": {"type": "string", "description": "Checkbox only: true or false"},
            "picklist_values": {"type": "array", "items": {"type": "string"}},
            "reference_to": {"type": "string", "description": "Target object of Lookup and MasterDetail fields"},
            "relationship_label": {"type": "string"},
            "relationship_name": {"type": "string"}
        },
        "required": ["object_name", "field_name", "label"]
    })
}

fn field_query(field: &FieldDescriptor) -> String {
    format!(
        "SELECT Id, QualifiedApiName FROM FieldDefinition \
         WHERE EntityDefinition.QualifiedApiName = '{}' AND QualifiedApiName = '{}'",
        soql::escape_string(field.object_name()),
        soql::escape_string(field.field_name())
    )
}

fn entity(field: &FieldDescriptor) -> String {
    format!("Field '{}.{}'", field.object_name(), field.field_name())
}

fn package(field: &FieldDescriptor, version: &str) -> Result<DeployPackage> {
    Ok(PackageBuilder::new(version).descriptor(field)?.build()?)
}

fn base_response(operation: &str, field: &FieldDescriptor) -> ToolResponse {
    ToolResponse::success(Some(operation))
        .with("object_name", field.object_name())
        .with("field_name", field.field_name())
        .with("field_type", field.field_type.as_str())
}

/// Result of the post-create access grant. Never affects the deploy's
/// own success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionGrant {
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_set_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
}

impl PermissionGrant {
    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Default::default()
        }
    }

    fn failed(permission_set_id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            permission_set_id,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct FieldPermissionRecord<'a> {
    parent_id: &'a str,
    sobject_type: &'a str,
    field: String,
    permissions_read: bool,
    permissions_edit: bool,
}

fn permission_set_query(name: Option<&str>) -> String {
    match name {
        Some(name) => format!(
            "SELECT Id FROM PermissionSet WHERE Name = '{}'",
            soql::escape_string(name)
        ),
        None => format!(
            "SELECT Id FROM PermissionSet WHERE IsOwnedByProfile = true AND Profile.Name = '{}'",
            soql::escape_string(ADMIN_PROFILE)
        ),
    }
}

/// Grant read and edit on a freshly deployed field.
#[instrument(skip(conn, field), fields(object = field.object_name(), field = field.field_name()))]
pub(crate) async fn grant_field_access(conn: &Connection, field: &FieldDescriptor) -> PermissionGrant {
    if field.required {
        return PermissionGrant::skipped("required fields are always visible and editable");
    }
    if field.field_type == FieldType::MasterDetail {
        return PermissionGrant::skipped("MasterDetail field access follows the parent record");
    }

    let query = permission_set_query(conn.config().permission_set.as_deref());
    let permission_set_id = match conn.find_one(QueryScope::Rest, &query).await {
        Ok(Some(record)) => match record.get("Id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => return PermissionGrant::failed(None, "permission set record carried no Id"),
        },
        Ok(None) => {
            warn!("No permission set found for field access grant");
            return PermissionGrant::failed(None, "permission set not found");
        }
        Err(e) => {
            warn!(error = %e, "Permission set lookup failed");
            return PermissionGrant::failed(None, e.to_string());
        }
    };

    let record = FieldPermissionRecord {
        parent_id: &permission_set_id,
        sobject_type: field.object_name(),
        field: format!("{}.{}", field.object_name(), field.field_name()),
        permissions_read: true,
        permissions_edit: true,
    };

    match conn
        .client()
        .rest_post::<Value, _>("sobjects/FieldPermissions", &record)
        .await
    {
        Ok(response) if response.get("success").and_then(Value::as_bool) != Some(false) => {
            info!(permission_set_id, "Granted field access");
            PermissionGrant {
                granted: true,
                permission_set_id: Some(permission_set_id),
                ..Default::default()
            }
        }
        Ok(response) => PermissionGrant::failed(
            Some(permission_set_id),
            response
                .get("errors")
                .map(Value::to_string)
                .unwrap_or_else(|| "field permission was not created".to_string()),
        ),
        Err(e) => {
            warn!(error = %e, "Field access grant failed");
            PermissionGrant::failed(Some(permission_set_id), e.to_string())
        }
    }
}

pub async fn create_custom_field(ctx: &ToolContext, args: FieldArgs) -> Result<ToolResponse> {
    let field = args.descriptor()?;
    let package = package(&field, &ctx.config().api_version)?;

    let conn = ctx.connect().await?;
    pipeline::check_existence(
        &conn,
        QueryScope::Tooling,
        &field_query(&field),
        Precondition::Absent,
        &entity(&field),
    )
    .await?;

    if let Err(err) = pipeline::deploy(&conn, &package, DeployMode::ValidateOnly).await {
        let response = ToolResponse::from_error(Some("create_custom_field"), &err)
            .with("object_name", field.object_name())
            .with("field_name", field.field_name())
            .with("field_type", field.field_type.as_str())
            .with("validation_only", true);
        // A timed-out validation has no verdict yet; keep the status-tool guidance.
        return Ok(match err.kind {
            ErrorKind::TimedOut { .. } => response,
            _ => response.with(
                "message",
                format!("Validation of {} failed; nothing was deployed", entity(&field)),
            ),
        });
    }

    let outcome = pipeline::deploy(&conn, &package, DeployMode::Commit).await?;
    let grant = grant_field_access(&conn, &field).await;

    Ok(base_response("create_custom_field", &field)
        .with_outcome(&outcome)
        .with("permission_grant", grant)
        .with(
            "message",
            format!("Successfully created {}", entity(&field)),
        ))
}

pub async fn update_custom_field(ctx: &ToolContext, args: FieldArgs) -> Result<ToolResponse> {
    let field = args.descriptor()?;
    let package = package(&field, &ctx.config().api_version)?;

    let conn = ctx.connect().await?;
    pipeline::check_existence(
        &conn,
        QueryScope::Tooling,
        &field_query(&field),
        Precondition::Present,
        &entity(&field),
    )
    .await?;

    let outcome = pipeline::deploy(&conn, &package, DeployMode::Commit).await?;
    Ok(base_response("update_custom_field", &field)
        .with_outcome(&outcome)
        .with(
            "message",
            format!("Successfully updated {}", entity(&field)),
        ))
}

pub struct CreateCustomField;

impl ToolHandler for CreateCustomField {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "create_custom_field",
            "Create a custom field. The field is validated by the org before it is deployed, \
             then read and edit access is granted to the administrator permission set.",
            input_schema(),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("create_custom_field", args, move |a| {
            create_custom_field(ctx, a)
        }))
    }
}

pub struct UpdateCustomField;

impl ToolHandler for UpdateCustomField {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "update_custom_field",
            "Redeploy an existing custom field with new attributes.",
            input_schema(),
        )
    }

    fn call<'a>(&'a self, ctx: &'a ToolContext, args: Value) -> BoxFuture<'a, ToolResponse> {
        Box::pin(invoke("update_custom_field", args, move |a| {
            update_custom_field(ctx, a)
        }))
    }
}
