//! Lightning web component bundles.

use super::{Descriptor, DocumentFile, XmlDoc};
use crate::error::{descriptor_error, Result};
use crate::naming;
use crate::types::MetadataKind;

/// Targets declared when an exposed bundle does not name its own.
pub const DEFAULT_TARGETS: &[&str] = &[
    "lightning__RecordPage",
    "lightning__AppPage",
    "lightning__HomePage",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    name: String,
    pub html: String,
    pub js: String,
    pub css: Option<String>,
    pub svg: Option<String>,
    pub is_exposed: bool,
    pub master_label: Option<String>,
    pub description: Option<String>,
    /// Empty means [`DEFAULT_TARGETS`].
    pub targets: Vec<String>,
}

impl ComponentDescriptor {
    pub fn new(name: &str, html: impl Into<String>, js: impl Into<String>) -> Result<Self> {
        naming::validate_component_name(name)?;
        Ok(Self {
            name: name.to_string(),
            html: html.into(),
            js: js.into(),
            css: None,
            svg: None,
            is_exposed: false,
            master_label: None,
            description: None,
            targets: Vec::new(),
        })
    }

    /// A bundle with the starter template and controller.
    pub fn with_default_templates(name: &str) -> Result<Self> {
        Self::new(name, default_html(name), default_js(name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exposed(mut self) -> Self {
        self.is_exposed = true;
        self
    }

    fn file_path(&self, extension: &str) -> String {
        format!(
            "{}/{}/{}.{}",
            MetadataKind::LightningComponentBundle.directory(),
            self.name,
            self.name,
            extension
        )
    }

    /// Targets are only written for exposed bundles.
    pub fn meta_xml(&self, api_version: &str) -> Result<String> {
        let mut doc = XmlDoc::new("LightningComponentBundle")?;
        doc.element("apiVersion", api_version)?;
        doc.flag("isExposed", self.is_exposed)?;
        doc.optional("masterLabel", self.master_label.as_deref())?;
        doc.optional("description", self.description.as_deref())?;
        if self.is_exposed {
            doc.open("targets")?;
            if self.targets.is_empty() {
                for target in DEFAULT_TARGETS {
                    doc.element("target", target)?;
                }
            } else {
                for target in &self.targets {
                    doc.element("target", target.trim())?;
                }
            }
            doc.close("targets")?;
        }
        doc.finish()
    }
}

impl Descriptor for ComponentDescriptor {
    fn kind(&self) -> MetadataKind {
        MetadataKind::LightningComponentBundle
    }

    fn member_name(&self) -> String {
        self.name.clone()
    }

    fn render(&self, api_version: &str) -> Result<Vec<DocumentFile>> {
        if self.html.trim().is_empty() {
            return Err(descriptor_error("component HTML template must not be empty"));
        }
        if self.js.trim().is_empty() {
            return Err(descriptor_error("component JavaScript must not be empty"));
        }
        if self.targets.iter().any(|t| t.trim().is_empty()) {
            return Err(descriptor_error("component targets must not be empty"));
        }

        let mut files = vec![
            DocumentFile::new(self.file_path("html"), self.html.clone()),
            DocumentFile::new(self.file_path("js"), self.js.clone()),
            DocumentFile::new(self.file_path("js-meta.xml"), self.meta_xml(api_version)?),
        ];
        if let Some(css) = &self.css {
            files.push(DocumentFile::new(self.file_path("css"), css.clone()));
        }
        if let Some(svg) = &self.svg {
            files.push(DocumentFile::new(self.file_path("svg"), svg.clone()));
        }
        Ok(files)
    }
}

pub fn default_html(name: &str) -> String {
    format!(
        "<template>\n    <div class=\"{name}\">\n        <h1>Hello from {name}!</h1>\n        <p>This is a new Lightning Web Component.</p>\n    </div>\n</template>\n"
    )
}

pub fn default_js(name: &str) -> String {
    format!(
        "import {{ LightningElement }} from 'lwc';\n\nexport default class {} extends LightningElement {{\n}}\n",
        naming::pascal_case(name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::test_support::parse;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_templates() {
        let bundle = ComponentDescriptor::with_default_templates("accountCard").unwrap();
        assert!(bundle.html.contains("Hello from accountCard!"));
        assert!(bundle.js.contains("export default class AccountCard extends LightningElement"));

        let files = bundle.render("62.0").unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "lwc/accountCard/accountCard.html",
                "lwc/accountCard/accountCard.js",
                "lwc/accountCard/accountCard.js-meta.xml",
            ]
        );
    }

    #[test]
    fn test_unexposed_bundle_has_no_targets() {
        let bundle = ComponentDescriptor::with_default_templates("accountCard").unwrap();
        let meta = parse(&bundle.meta_xml("62.0").unwrap());
        assert_eq!(meta.root, "LightningComponentBundle");
        assert_eq!(meta.get("apiVersion"), Some("62.0"));
        assert_eq!(meta.get("isExposed"), Some("false"));
        assert!(meta.all("targets/target").is_empty());
    }

    #[test]
    fn test_exposed_bundle_targets() {
        let bundle = ComponentDescriptor::with_default_templates("accountCard")
            .unwrap()
            .exposed();
        let meta = parse(&bundle.meta_xml("62.0").unwrap());
        assert_eq!(meta.get("isExposed"), Some("true"));
        assert_eq!(meta.all("targets/target"), DEFAULT_TARGETS.to_vec());

        let mut custom = bundle.clone();
        custom.targets = vec!["lightning__Tab".into()];
        let meta = parse(&custom.meta_xml("62.0").unwrap());
        assert_eq!(meta.all("targets/target"), vec!["lightning__Tab"]);
    }

    #[test]
    fn test_optional_files() {
        let mut bundle = ComponentDescriptor::with_default_templates("accountCard").unwrap();
        bundle.css = Some(".accountCard { color: red; }".into());
        let files = bundle.render("62.0").unwrap();
        assert_eq!(files.len(), 4);
        assert_eq!(files[3].path, "lwc/accountCard/accountCard.css");
    }

    #[test]
    fn test_missing_sources_rejected() {
        let bundle = ComponentDescriptor::new("accountCard", "<template></template>", "").unwrap();
        let err = bundle.render("62.0").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Descriptor(_)));

        let err = ComponentDescriptor::new("AccountCard", "x", "y").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidName(_)));
    }
}
