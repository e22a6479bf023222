//! Custom object documents.

use serde::{Deserialize, Serialize};

use super::{Descriptor, DocumentFile, XmlDoc};
use crate::error::{descriptor_error, Result};
use crate::naming;
use crate::types::MetadataKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SharingModel {
    Private,
    Read,
    #[default]
    ReadWrite,
    ControlledByParent,
}

impl SharingModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharingModel::Private => "Private",
            SharingModel::Read => "Read",
            SharingModel::ReadWrite => "ReadWrite",
            SharingModel::ControlledByParent => "ControlledByParent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeploymentStatus {
    #[default]
    Deployed,
    InDevelopment,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Deployed => "Deployed",
            DeploymentStatus::InDevelopment => "InDevelopment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NameFieldType {
    #[default]
    Text,
    AutoNumber,
}

impl NameFieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NameFieldType::Text => "Text",
            NameFieldType::AutoNumber => "AutoNumber",
        }
    }
}

/// A custom object definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDescriptor {
    object_name: String,
    pub label: String,
    pub plural_label: String,
    pub description: Option<String>,
    /// Defaults to `"{label} Name"`.
    pub name_field_label: Option<String>,
    pub name_field_type: NameFieldType,
    /// Required for auto-number name fields, e.g. `INV-{0000}`.
    pub display_format: Option<String>,
    pub sharing_model: SharingModel,
    pub deployment_status: DeploymentStatus,
    pub enable_activities: bool,
    pub enable_reports: bool,
    pub enable_search: bool,
}

impl ObjectDescriptor {
    pub fn new(
        object_name: &str,
        label: impl Into<String>,
        plural_label: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            object_name: naming::normalize_custom_name(object_name)?,
            label: label.into(),
            plural_label: plural_label.into(),
            description: None,
            name_field_label: None,
            name_field_type: NameFieldType::default(),
            display_format: None,
            sharing_model: SharingModel::default(),
            deployment_status: DeploymentStatus::default(),
            enable_activities: true,
            enable_reports: true,
            enable_search: true,
        })
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn path(&self) -> String {
        format!(
            "{}/{}.object",
            MetadataKind::CustomObject.directory(),
            self.object_name
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_auto_number(mut self, display_format: impl Into<String>) -> Self {
        self.name_field_type = NameFieldType::AutoNumber;
        self.display_format = Some(display_format.into());
        self
    }

    pub fn to_xml(&self) -> Result<String> {
        let label = self.label.trim();
        let plural_label = self.plural_label.trim();
        if label.is_empty() {
            return Err(descriptor_error("label must not be empty"));
        }
        if plural_label.is_empty() {
            return Err(descriptor_error("plural label must not be empty"));
        }

        let display_format = match (self.name_field_type, self.display_format.as_deref()) {
            (NameFieldType::AutoNumber, Some(format)) if !format.trim().is_empty() => Some(format),
            (NameFieldType::AutoNumber, _) => {
                return Err(descriptor_error("auto-number name fields require a display format"))
            }
            (NameFieldType::Text, Some(_)) => {
                return Err(descriptor_error("display format is only allowed for auto-number name fields"))
            }
            (NameFieldType::Text, None) => None,
        };

        let name_label = match self.name_field_label.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{label} Name"),
        };

        let mut doc = XmlDoc::new("CustomObject")?;
        doc.element("label", label)?;
        doc.element("pluralLabel", plural_label)?;
        doc.optional("description", self.description.as_deref())?;
        doc.open("nameField")?;
        doc.element("label", &name_label)?;
        doc.element("type", self.name_field_type.as_str())?;
        doc.optional("displayFormat", display_format)?;
        doc.close("nameField")?;
        doc.element("deploymentStatus", self.deployment_status.as_str())?;
        doc.element("sharingModel", self.sharing_model.as_str())?;
        doc.flag("enableActivities", self.enable_activities)?;
        doc.flag("enableReports", self.enable_reports)?;
        doc.flag("enableSearch", self.enable_search)?;
        doc.finish()
    }
}

impl Descriptor for ObjectDescriptor {
    fn kind(&self) -> MetadataKind {
        MetadataKind::CustomObject
    }

    fn member_name(&self) -> String {
        self.object_name.clone()
    }

    fn render(&self, _api_version: &str) -> Result<Vec<DocumentFile>> {
        Ok(vec![DocumentFile::new(self.path(), self.to_xml()?)])
    }
}
