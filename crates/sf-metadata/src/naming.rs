//! Identifier grammar for generated metadata.
//!
//! Every name that ends up in a document path, a manifest member or a query
//! passes through one of these functions first.

use crate::error::{Error, ErrorKind, Result};

/// Suffix carried by custom objects and fields.
pub const CUSTOM_SUFFIX: &str = "__c";

/// Maximum identifier length, excluding any suffix.
pub const MAX_NAME_LENGTH: usize = 40;

/// Built-in objects accepted verbatim as field parents.
pub const STANDARD_OBJECTS: &[&str] = &[
    "Account",
    "Asset",
    "Campaign",
    "Case",
    "Contact",
    "Contract",
    "Event",
    "Lead",
    "Opportunity",
    "Order",
    "Product2",
    "Task",
    "User",
];

fn invalid(message: String) -> Error {
    Error::new(ErrorKind::InvalidName(message))
}

fn check_identifier(what: &str, name: &str, first: impl Fn(char) -> bool) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(format!("{what} name must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(invalid(format!(
            "{what} name '{name}' exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    if !name.chars().next().is_some_and(&first) {
        return Err(invalid(format!(
            "{what} name '{name}' must start with a letter"
        )));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(invalid(format!(
            "{what} name '{name}' contains invalid character '{c}'"
        )));
    }
    if name.contains("__") {
        return Err(invalid(format!(
            "{what} name '{name}' must not contain consecutive underscores"
        )));
    }
    if name.ends_with('_') {
        return Err(invalid(format!(
            "{what} name '{name}' must not end with an underscore"
        )));
    }
    Ok(())
}

/// Validate an Apex class name.
pub fn validate_apex_class_name(name: &str) -> Result<()> {
    check_identifier("Apex class", name, |c| c.is_ascii_alphabetic())
}

/// Validate a Lightning web component bundle name.
pub fn validate_component_name(name: &str) -> Result<()> {
    check_identifier("Component", name, |c| c.is_ascii_lowercase())
}

/// Validate the relationship name of a lookup or master-detail field.
pub fn validate_relationship_name(name: &str) -> Result<()> {
    check_identifier("Relationship", name, |c| c.is_ascii_alphabetic())
}

pub fn is_standard_object(name: &str) -> bool {
    STANDARD_OBJECTS.contains(&name)
}

/// Append `__c` when missing and validate the base name.
pub fn normalize_custom_name(name: &str) -> Result<String> {
    let name = name.trim();
    let base = name.strip_suffix(CUSTOM_SUFFIX).unwrap_or(name);
    check_identifier("Custom", base, |c| c.is_ascii_alphabetic())?;
    Ok(format!("{base}{CUSTOM_SUFFIX}"))
}

/// Normalize the parent object of a field. Standard objects pass through
/// unchanged; anything else is treated as a custom object.
pub fn normalize_parent_object(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if is_standard_object(trimmed) {
        return Ok(trimmed.to_string());
    }
    normalize_custom_name(trimmed)
}

/// The name without its `__c` suffix.
pub fn base_name(api_name: &str) -> &str {
    api_name.strip_suffix(CUSTOM_SUFFIX).unwrap_or(api_name)
}

/// `myWidget_list` becomes `MyWidgetList`.
pub fn pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
