//! Custom field documents.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use super::{Descriptor, DocumentFile, XmlDoc};
use crate::error::{descriptor_error, Result};
use crate::naming;
use crate::types::MetadataKind;

/// Field data types supported for generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Text,
    TextArea,
    LongTextArea,
    Number,
    Currency,
    Percent,
    Checkbox,
    Date,
    DateTime,
    Email,
    Phone,
    Url,
    Picklist,
    MultiselectPicklist,
    Lookup,
    MasterDetail,
}

impl FieldType {
    pub const ALL: [FieldType; 16] = [
        FieldType::Text,
        FieldType::TextArea,
        FieldType::LongTextArea,
        FieldType::Number,
        FieldType::Currency,
        FieldType::Percent,
        FieldType::Checkbox,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Url,
        FieldType::Picklist,
        FieldType::MultiselectPicklist,
        FieldType::Lookup,
        FieldType::MasterDetail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::TextArea => "TextArea",
            FieldType::LongTextArea => "LongTextArea",
            FieldType::Number => "Number",
            FieldType::Currency => "Currency",
            FieldType::Percent => "Percent",
            FieldType::Checkbox => "Checkbox",
            FieldType::Date => "Date",
            FieldType::DateTime => "DateTime",
            FieldType::Email => "Email",
            FieldType::Phone => "Phone",
            FieldType::Url => "Url",
            FieldType::Picklist => "Picklist",
            FieldType::MultiselectPicklist => "MultiselectPicklist",
            FieldType::Lookup => "Lookup",
            FieldType::MasterDetail => "MasterDetail",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Currency | FieldType::Percent)
    }

    fn is_picklist(&self) -> bool {
        matches!(self, FieldType::Picklist | FieldType::MultiselectPicklist)
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, FieldType::Lookup | FieldType::MasterDetail)
    }

    fn allows_unique(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Number | FieldType::Email)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let supported: Vec<_> = FieldType::ALL.iter().map(|t| t.as_str()).collect();
                descriptor_error(format!(
                    "unsupported field type '{s}', expected one of: {}",
                    supported.join(", ")
                ))
            })
    }
}

/// A custom field on a standard or custom object.
///
/// Object and field names are normalized at construction; every other
/// attribute is checked against the field type when rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    object_name: String,
    field_name: String,
    pub label: String,
    pub field_type: FieldType,
    pub description: Option<String>,
    pub required: bool,
    pub unique: bool,
    pub external_id: bool,
    pub length: Option<u32>,
    pub visible_lines: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default_value: Option<String>,
    pub picklist_values: Vec<String>,
    pub reference_to: Option<String>,
    pub relationship_label: Option<String>,
    pub relationship_name: Option<String>,
}

/// Attribute values after defaults are applied.
struct Resolved<'a> {
    length: Option<u32>,
    visible_lines: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
    default_value: Option<&'a str>,
    required: Option<bool>,
    reference_to: Option<String>,
    relationship_name: Option<String>,
    delete_constraint: Option<&'static str>,
}

impl FieldDescriptor {
    pub fn new(
        object_name: &str,
        field_name: &str,
        label: impl Into<String>,
        field_type: FieldType,
    ) -> Result<Self> {
        Ok(Self {
            object_name: naming::normalize_parent_object(object_name)?,
            field_name: naming::normalize_custom_name(field_name)?,
            label: label.into(),
            field_type,
            description: None,
            required: false,
            unique: false,
            external_id: false,
            length: None,
            visible_lines: None,
            precision: None,
            scale: None,
            default_value: None,
            picklist_values: Vec::new(),
            reference_to: None,
            relationship_label: None,
            relationship_name: None,
        })
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Archive path of the parent object document.
    pub fn path(&self) -> String {
        format!(
            "{}/{}.object",
            MetadataKind::CustomField.directory(),
            self.object_name
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn with_picklist_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.picklist_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reference_to(mut self, object: impl Into<String>) -> Self {
        self.reference_to = Some(object.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn resolve(&self) -> Result<Resolved<'_>> {
        let ty = self.field_type;
        let not_allowed = |attr: &str| descriptor_error(format!("{attr} is not allowed for {ty} fields"));

        if self.label.trim().is_empty() {
            return Err(descriptor_error("label must not be empty"));
        }

        let length = match (ty, self.length) {
            (FieldType::Text, len) => Some(in_range("length", len.unwrap_or(255), 1, 255)?),
            (FieldType::LongTextArea, len) => {
                Some(in_range("length", len.unwrap_or(32768), 256, 131_072)?)
            }
            (_, Some(_)) => return Err(not_allowed("length")),
            (_, None) => None,
        };

        let visible_lines = match (ty, self.visible_lines) {
            (FieldType::LongTextArea, lines) => Some(in_range("visibleLines", lines.unwrap_or(3), 1, 50)?),
            (FieldType::MultiselectPicklist, lines) => {
                Some(in_range("visibleLines", lines.unwrap_or(4), 1, 50)?)
            }
            (_, Some(_)) => return Err(not_allowed("visibleLines")),
            (_, None) => None,
        };

        let (precision, scale) = if ty.is_numeric() {
            let precision = in_range("precision", self.precision.unwrap_or(18), 1, 18)?;
            let scale = in_range("scale", self.scale.unwrap_or(0), 0, precision)?;
            (Some(precision), Some(scale))
        } else if self.precision.is_some() {
            return Err(not_allowed("precision"));
        } else if self.scale.is_some() {
            return Err(not_allowed("scale"));
        } else {
            (None, None)
        };

        let default_value = match (ty, self.default_value.as_deref()) {
            (FieldType::Checkbox, None) => Some("false"),
            (FieldType::Checkbox, Some(v @ ("true" | "false"))) => Some(v),
            (FieldType::Checkbox, Some(other)) => {
                return Err(descriptor_error(format!(
                    "defaultValue for Checkbox fields must be true or false, got '{other}'"
                )))
            }
            (_, Some(_)) => return Err(not_allowed("defaultValue")),
            (_, None) => None,
        };

        let required = match ty {
            FieldType::Checkbox | FieldType::MasterDetail if self.required => {
                return Err(not_allowed("required"))
            }
            FieldType::Checkbox | FieldType::MasterDetail => None,
            _ => Some(self.required),
        };

        if self.unique && !ty.allows_unique() {
            return Err(not_allowed("unique"));
        }
        if self.external_id && !ty.allows_unique() {
            return Err(not_allowed("externalId"));
        }

        if ty.is_picklist() {
            check_picklist_values(&self.picklist_values)?;
        } else if !self.picklist_values.is_empty() {
            return Err(not_allowed("picklist values"));
        }

        let (reference_to, relationship_name, delete_constraint) = if ty.is_relationship() {
            let target = self
                .reference_to
                .as_deref()
                .ok_or_else(|| descriptor_error(format!("{ty} fields require referenceTo")))?;
            let target = naming::normalize_parent_object(target)?;
            let relationship_name = match self.relationship_name.as_deref() {
                Some(name) => name.to_string(),
                None => naming::base_name(&self.field_name).to_string(),
            };
            naming::validate_relationship_name(&relationship_name)?;
            let delete_constraint = match ty {
                FieldType::Lookup if self.required => Some("Restrict"),
                FieldType::Lookup => Some("SetNull"),
                _ => None,
            };
            (Some(target), Some(relationship_name), delete_constraint)
        } else if self.reference_to.is_some() {
            return Err(not_allowed("referenceTo"));
        } else if self.relationship_name.is_some() {
            return Err(not_allowed("relationshipName"));
        } else if self.relationship_label.is_some() {
            return Err(not_allowed("relationshipLabel"));
        } else {
            (None, None, None)
        };

        Ok(Resolved {
            length,
            visible_lines,
            precision,
            scale,
            default_value,
            required,
            reference_to,
            relationship_name,
            delete_constraint,
        })
    }

    /// Render the `<CustomObject>` document carrying this field.
    pub fn to_xml(&self) -> Result<String> {
        let r = self.resolve()?;
        let mut doc = XmlDoc::new("CustomObject")?;
        doc.open("fields")?;
        doc.element("fullName", &self.field_name)?;
        doc.element("label", self.label.trim())?;
        doc.element("type", self.field_type.as_str())?;
        if let Some(length) = r.length {
            doc.number("length", length)?;
        }
        if let Some(lines) = r.visible_lines {
            doc.number("visibleLines", lines)?;
        }
        if let Some(precision) = r.precision {
            doc.number("precision", precision)?;
        }
        if let Some(scale) = r.scale {
            doc.number("scale", scale)?;
        }
        doc.optional("defaultValue", r.default_value)?;
        doc.optional("description", self.description.as_deref())?;
        if let Some(required) = r.required {
            doc.flag("required", required)?;
        }
        if self.unique {
            doc.flag("unique", true)?;
        }
        if self.external_id {
            doc.flag("externalId", true)?;
        }
        if self.field_type.is_picklist() {
            doc.open("valueSet")?;
            doc.flag("restricted", true)?;
            doc.open("valueSetDefinition")?;
            doc.flag("sorted", false)?;
            for value in &self.picklist_values {
                doc.open("value")?;
                doc.element("fullName", value.trim())?;
                doc.flag("default", false)?;
                doc.element("label", value.trim())?;
                doc.close("value")?;
            }
            doc.close("valueSetDefinition")?;
            doc.close("valueSet")?;
        }
        doc.optional("referenceTo", r.reference_to.as_deref())?;
        doc.optional("relationshipLabel", self.relationship_label.as_deref())?;
        doc.optional("relationshipName", r.relationship_name.as_deref())?;
        doc.optional("deleteConstraint", r.delete_constraint)?;
        doc.close("fields")?;
        doc.finish()
    }
}

fn in_range(attr: &str, value: u32, min: u32, max: u32) -> Result<u32> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(descriptor_error(format!(
            "{attr} must be between {min} and {max}, got {value}"
        )))
    }
}

fn check_picklist_values(values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(descriptor_error("picklist fields require at least one value"));
    }
    let mut seen = HashSet::new();
    for value in values {
        let value = value.trim();
        if value.is_empty() {
            return Err(descriptor_error("picklist values must not be empty"));
        }
        if !seen.insert(value.to_lowercase()) {
            return Err(descriptor_error(format!("duplicate picklist value '{value}'")));
        }
    }
    Ok(())
}

impl Descriptor for FieldDescriptor {
    fn kind(&self) -> MetadataKind {
        MetadataKind::CustomField
    }

    fn member_name(&self) -> String {
        format!("{}.{}", self.object_name, self.field_name)
    }

    fn render(&self, _api_version: &str) -> Result<Vec<DocumentFile>> {
        Ok(vec![DocumentFile::new(self.path(), self.to_xml()?)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::test_support::parse;
    use crate::error::ErrorKind;
    use crate::types::METADATA_NAMESPACE;

    fn field(ty: FieldType) -> FieldDescriptor {
        FieldDescriptor::new("Account", "Tier", "Tier", ty).unwrap()
    }

    fn assert_descriptor_error(result: Result<String>) {
        let err = result.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Descriptor(_)), "{err}");
    }

    #[test]
    fn test_names_are_normalized() {
        let f = FieldDescriptor::new("Invoice", "Due_Date", "Due Date", FieldType::Date).unwrap();
        assert_eq!(f.object_name(), "Invoice__c");
        assert_eq!(f.field_name(), "Due_Date__c");
        assert_eq!(f.member_name(), "Invoice__c.Due_Date__c");
        assert_eq!(f.path(), "objects/Invoice__c.object");

        let err = FieldDescriptor::new("Account", "bad name", "x", FieldType::Text).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidName(_)));
    }

    #[test]
    fn test_field_type_parsing() {
        assert_eq!("checkbox".parse::<FieldType>().unwrap(), FieldType::Checkbox);
        assert_eq!("MultiselectPicklist".parse::<FieldType>().unwrap(), FieldType::MultiselectPicklist);
        assert!("Geolocation".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_text_field_defaults() {
        let xml = field(FieldType::Text).to_xml().unwrap();
        let doc = parse(&xml);

        assert_eq!(doc.root, "CustomObject");
        assert_eq!(doc.namespace.as_deref(), Some(METADATA_NAMESPACE));
        assert_eq!(doc.get("fields/fullName"), Some("Tier__c"));
        assert_eq!(doc.get("fields/type"), Some("Text"));
        assert_eq!(doc.get("fields/length"), Some("255"));
        assert_eq!(doc.get("fields/required"), Some("false"));
        assert_eq!(doc.get("fields/unique"), None);
    }

    #[test]
    fn test_element_order() {
        let mut f = field(FieldType::Lookup)
            .with_reference_to("Contact")
            .with_description("Primary contact");
        f.relationship_label = Some("Tiers".into());
        let doc = parse(&f.to_xml().unwrap());

        assert_eq!(
            doc.children("fields"),
            vec![
                "fullName",
                "label",
                "type",
                "description",
                "required",
                "referenceTo",
                "relationshipLabel",
                "relationshipName",
                "deleteConstraint",
            ]
        );
        assert_eq!(doc.get("fields/relationshipName"), Some("Tier"));
        assert_eq!(doc.get("fields/deleteConstraint"), Some("SetNull"));
    }

    #[test]
    fn test_required_lookup_restricts_delete() {
        let f = field(FieldType::Lookup).with_reference_to("Contact").required();
        let doc = parse(&f.to_xml().unwrap());
        assert_eq!(doc.get("fields/required"), Some("true"));
        assert_eq!(doc.get("fields/deleteConstraint"), Some("Restrict"));
    }

    #[test]
    fn test_master_detail() {
        let f = field(FieldType::MasterDetail).with_reference_to("Invoice");
        let doc = parse(&f.to_xml().unwrap());
        assert_eq!(doc.get("fields/referenceTo"), Some("Invoice__c"));
        assert_eq!(doc.get("fields/required"), None);
        assert_eq!(doc.get("fields/deleteConstraint"), None);

        assert_descriptor_error(field(FieldType::MasterDetail).to_xml());
        assert_descriptor_error(
            field(FieldType::MasterDetail)
                .with_reference_to("Invoice")
                .required()
                .to_xml(),
        );
    }

    #[test]
    fn test_picklist_value_set() {
        let f = field(FieldType::Picklist).with_picklist_values(["Gold", "Silver & Bronze"]);
        let doc = parse(&f.to_xml().unwrap());

        assert_eq!(doc.get("fields/valueSet/restricted"), Some("true"));
        assert_eq!(
            doc.all("fields/valueSet/valueSetDefinition/value/fullName"),
            vec!["Gold", "Silver & Bronze"]
        );
        assert_eq!(
            doc.all("fields/valueSet/valueSetDefinition/value/default"),
            vec!["false", "false"]
        );
    }

    #[test]
    fn test_picklist_requires_distinct_values() {
        assert_descriptor_error(field(FieldType::Picklist).to_xml());
        assert_descriptor_error(
            field(FieldType::Picklist)
                .with_picklist_values(["Gold", "gold"])
                .to_xml(),
        );
        assert_descriptor_error(
            field(FieldType::Text).with_picklist_values(["Gold"]).to_xml(),
        );
    }

    #[test]
    fn test_multiselect_visible_lines() {
        let f = field(FieldType::MultiselectPicklist).with_picklist_values(["A", "B"]);
        let doc = parse(&f.to_xml().unwrap());
        assert_eq!(doc.get("fields/visibleLines"), Some("4"));
    }

    #[test]
    fn test_long_text_area_defaults_and_bounds() {
        let doc = parse(&field(FieldType::LongTextArea).to_xml().unwrap());
        assert_eq!(doc.get("fields/length"), Some("32768"));
        assert_eq!(doc.get("fields/visibleLines"), Some("3"));

        assert_descriptor_error(field(FieldType::LongTextArea).with_length(100).to_xml());
        assert_descriptor_error(field(FieldType::Text).with_length(256).to_xml());
    }

    #[test]
    fn test_number_precision_and_scale() {
        let doc = parse(&field(FieldType::Currency).to_xml().unwrap());
        assert_eq!(doc.get("fields/precision"), Some("18"));
        assert_eq!(doc.get("fields/scale"), Some("0"));

        let doc = parse(&field(FieldType::Number).with_precision(10, 2).to_xml().unwrap());
        assert_eq!(doc.get("fields/precision"), Some("10"));
        assert_eq!(doc.get("fields/scale"), Some("2"));

        assert_descriptor_error(field(FieldType::Number).with_precision(4, 5).to_xml());
        assert_descriptor_error(field(FieldType::Number).with_precision(19, 0).to_xml());
        assert_descriptor_error(field(FieldType::Text).with_precision(4, 0).to_xml());
    }

    #[test]
    fn test_checkbox_rules() {
        let doc = parse(&field(FieldType::Checkbox).to_xml().unwrap());
        assert_eq!(doc.get("fields/defaultValue"), Some("false"));
        assert_eq!(doc.get("fields/required"), None);

        let mut checked = field(FieldType::Checkbox);
        checked.default_value = Some("true".into());
        assert_eq!(parse(&checked.to_xml().unwrap()).get("fields/defaultValue"), Some("true"));

        checked.default_value = Some("yes".into());
        assert_descriptor_error(checked.to_xml());

        assert_descriptor_error(field(FieldType::Checkbox).required().to_xml());
        assert_descriptor_error(field(FieldType::Checkbox).with_length(10).to_xml());
    }

    #[test]
    fn test_unique_only_on_supported_types() {
        let mut email = field(FieldType::Email);
        email.unique = true;
        email.external_id = true;
        let doc = parse(&email.to_xml().unwrap());
        assert_eq!(doc.get("fields/unique"), Some("true"));
        assert_eq!(doc.get("fields/externalId"), Some("true"));

        let mut date = field(FieldType::Date);
        date.unique = true;
        assert_descriptor_error(date.to_xml());
    }

    #[test]
    fn test_label_is_escaped_and_required() {
        let f = FieldDescriptor::new("Account", "Terms", "Terms & <Conditions>", FieldType::TextArea)
            .unwrap();
        let xml = f.to_xml().unwrap();
        assert!(xml.contains("Terms &amp; &lt;Conditions&gt;"));
        assert_eq!(parse(&xml).get("fields/label"), Some("Terms & <Conditions>"));

        let blank = FieldDescriptor::new("Account", "Terms", "  ", FieldType::TextArea).unwrap();
        assert_descriptor_error(blank.to_xml());
    }

    #[test]
    fn test_render_is_deterministic() {
        let f = field(FieldType::Picklist).with_picklist_values(["A"]);
        let first = f.render("62.0").unwrap();
        let second = f.render("62.0").unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].path, "objects/Account.object");
    }
}
