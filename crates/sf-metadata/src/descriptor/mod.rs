//! Metadata document generators.
//!
//! Each descriptor validates its own attributes, then renders the files it
//! contributes to a deploy package. Rendering is pure: the same descriptor
//! and API version always produce the same bytes.

mod apex;
mod component;
mod field;
mod object;

pub use apex::ApexClassDescriptor;
pub use component::{default_html, default_js, ComponentDescriptor, DEFAULT_TARGETS};
pub use field::{FieldDescriptor, FieldType};
pub use object::{DeploymentStatus, NameFieldType, ObjectDescriptor, SharingModel};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use crate::error::{Error, ErrorKind, Result};
use crate::types::{MetadataKind, METADATA_NAMESPACE};

/// A file produced by a descriptor, addressed by its archive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub path: String,
    pub content: String,
}

impl DocumentFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Something that can be packaged for deployment.
pub trait Descriptor {
    fn kind(&self) -> MetadataKind;

    /// Manifest member name.
    fn member_name(&self) -> String;

    /// Validate and render every file this descriptor contributes.
    fn render(&self, api_version: &str) -> Result<Vec<DocumentFile>>;
}

fn xml_error(e: impl std::fmt::Display) -> Error {
    Error::new(ErrorKind::Xml(e.to_string()))
}

/// Indented metadata document writer.
pub(crate) struct XmlDoc {
    writer: Writer<Cursor<Vec<u8>>>,
    root: &'static str,
}

impl XmlDoc {
    /// Start a document whose root carries the metadata namespace.
    pub(crate) fn new(root: &'static str) -> Result<Self> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 4);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        let start = BytesStart::new(root).with_attributes([("xmlns", METADATA_NAMESPACE)]);
        writer.write_event(Event::Start(start)).map_err(xml_error)?;
        Ok(Self { writer, root })
    }

    pub(crate) fn open(&mut self, tag: &str) -> Result<()> {
        self.writer
            .write_event(Event::Start(BytesStart::new(tag)))
            .map_err(xml_error)
    }

    pub(crate) fn close(&mut self, tag: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(tag)))
            .map_err(xml_error)
    }

    /// `<tag>text</tag>`, with the text escaped.
    pub(crate) fn element(&mut self, tag: &str, text: &str) -> Result<()> {
        self.open(tag)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.close(tag)
    }

    pub(crate) fn optional(&mut self, tag: &str, text: Option<&str>) -> Result<()> {
        match text {
            Some(text) => self.element(tag, text),
            None => Ok(()),
        }
    }

    pub(crate) fn flag(&mut self, tag: &str, value: bool) -> Result<()> {
        self.element(tag, if value { "true" } else { "false" })
    }

    pub(crate) fn number(&mut self, tag: &str, value: u32) -> Result<()> {
        self.element(tag, &value.to_string())
    }

    pub(crate) fn finish(mut self) -> Result<String> {
        self.close(self.root)?;
        let bytes = self.writer.into_inner().into_inner();
        let mut xml = String::from_utf8(bytes).map_err(xml_error)?;
        xml.push('\n');
        Ok(xml)
    }
}
