//! Apex class documents.

use super::{Descriptor, DocumentFile, XmlDoc};
use crate::error::{descriptor_error, Result};
use crate::naming;
use crate::types::MetadataKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApexClassDescriptor {
    name: String,
    pub body: String,
    /// Overrides the package API version in the meta document.
    pub api_version: Option<String>,
}

impl ApexClassDescriptor {
    pub fn new(name: &str, body: impl Into<String>) -> Result<Self> {
        naming::validate_apex_class_name(name)?;
        Ok(Self {
            name: name.to_string(),
            body: body.into(),
            api_version: None,
        })
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_path(&self) -> String {
        format!("{}/{}.cls", MetadataKind::ApexClass.directory(), self.name)
    }

    pub fn meta_path(&self) -> String {
        format!("{}-meta.xml", self.source_path())
    }

    pub fn meta_xml(&self, api_version: &str) -> Result<String> {
        let mut doc = XmlDoc::new("ApexClass")?;
        doc.element("apiVersion", self.api_version.as_deref().unwrap_or(api_version))?;
        doc.element("status", "Active")?;
        doc.finish()
    }
}

impl Descriptor for ApexClassDescriptor {
    fn kind(&self) -> MetadataKind {
        MetadataKind::ApexClass
    }

    fn member_name(&self) -> String {
        self.name.clone()
    }

    fn render(&self, api_version: &str) -> Result<Vec<DocumentFile>> {
        if self.body.trim().is_empty() {
            return Err(descriptor_error("Apex class body must not be empty"));
        }
        Ok(vec![
            DocumentFile::new(self.source_path(), self.body.clone()),
            DocumentFile::new(self.meta_path(), self.meta_xml(api_version)?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::test_support::parse;
    use crate::error::ErrorKind;

    const BODY: &str = "public class Greeter {\n    public static String hi() { return 'hi'; }\n}\n";

    #[test]
    fn test_renders_source_and_meta() {
        let class = ApexClassDescriptor::new("Greeter", BODY).unwrap();
        let files = class.render("62.0").unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "classes/Greeter.cls");
        assert_eq!(files[0].content, BODY);
        assert_eq!(files[1].path, "classes/Greeter.cls-meta.xml");

        let meta = parse(&files[1].content);
        assert_eq!(meta.root, "ApexClass");
        assert_eq!(meta.get("apiVersion"), Some("62.0"));
        assert_eq!(meta.get("status"), Some("Active"));
    }

    #[test]
    fn test_api_version_override() {
        let class = ApexClassDescriptor::new("Greeter", BODY)
            .unwrap()
            .with_api_version("58.0");
        let meta = parse(&class.meta_xml("62.0").unwrap());
        assert_eq!(meta.get("apiVersion"), Some("58.0"));
    }

    #[test]
    fn test_empty_body_rejected() {
        let class = ApexClassDescriptor::new("Greeter", "  \n").unwrap();
        let err = class.render("62.0").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Descriptor(_)));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let err = ApexClassDescriptor::new("Bad__Name", BODY).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidName(_)));
    }
}
