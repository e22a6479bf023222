//! Deploy package assembly.
//!
//! A package is a manifest plus a set of documents, zipped in the layout the
//! Metadata API expects. Packages are immutable once built and archiving the
//! same package twice yields identical bytes.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::descriptor::{Descriptor, XmlDoc};
use crate::error::{package_error, Result};
use crate::types::{MetadataKind, MANIFEST_PATH};

/// Package manifest (`package.xml`).
///
/// Types are listed in kind-name order, members sorted within each type, and
/// every value is escaped by the XML writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub types: Vec<PackageTypeMembers>,
    pub version: String,
}

/// Type members in a package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTypeMembers {
    pub name: String,
    pub members: Vec<String>,
}

impl PackageManifest {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            types: Vec::new(),
            version: version.into(),
        }
    }

    pub fn add_type(mut self, name: impl Into<String>, members: Vec<String>) -> Self {
        self.types.push(PackageTypeMembers {
            name: name.into(),
            members,
        });
        self
    }

    /// Number of distinct members across all types.
    pub fn member_count(&self) -> usize {
        self.types.iter().map(|t| t.members.len()).sum()
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut doc = XmlDoc::new("Package")?;
        for type_members in &self.types {
            doc.open("types")?;
            for member in &type_members.members {
                doc.element("members", member)?;
            }
            doc.element("name", &type_members.name)?;
            doc.close("types")?;
        }
        doc.element("version", &self.version)?;
        doc.finish()
    }
}

/// Accumulates members and documents for one deployment.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    version: String,
    members: BTreeMap<MetadataKind, BTreeSet<String>>,
    files: BTreeMap<String, String>,
}

impl PackageBuilder {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            members: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    /// Declare a manifest member. Declaring the same member twice is a no-op.
    pub fn member(mut self, kind: MetadataKind, name: impl Into<String>) -> Self {
        self.members.entry(kind).or_default().insert(name.into());
        self
    }

    /// Add a document at `path`.
    pub fn file(mut self, path: impl Into<String>, content: impl Into<String>) -> Result<Self> {
        let path = path.into();
        check_path(&path)?;

        let lowered = path.to_lowercase();
        if let Some(existing) = self.files.keys().find(|p| p.to_lowercase() == lowered) {
            return Err(package_error(format!(
                "path '{path}' collides with '{existing}'"
            )));
        }

        self.files.insert(path, content.into());
        Ok(self)
    }

    /// Render a descriptor at the package version and add its member and
    /// documents.
    pub fn descriptor(self, descriptor: &dyn Descriptor) -> Result<Self> {
        let files = descriptor.render(&self.version)?;
        let mut builder = self.member(descriptor.kind(), descriptor.member_name());
        for file in files {
            builder = builder.file(file.path, file.content)?;
        }
        Ok(builder)
    }

    pub fn build(self) -> Result<DeployPackage> {
        if self.files.is_empty() {
            return Err(package_error("package contains no files"));
        }
        if self.members.values().all(BTreeSet::is_empty) {
            return Err(package_error("package declares no members"));
        }

        let directories: BTreeSet<&str> = self.members.keys().map(|k| k.directory()).collect();
        for path in self.files.keys() {
            let covered = directories.iter().any(|dir| {
                path.strip_prefix(dir)
                    .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
            });
            if !covered {
                return Err(package_error(format!(
                    "path '{path}' is not under the directory of any declared kind"
                )));
            }
        }

        let manifest = self
            .members
            .into_iter()
            .filter(|(_, members)| !members.is_empty())
            .fold(PackageManifest::new(self.version), |manifest, (kind, members)| {
                manifest.add_type(kind.as_str(), members.into_iter().collect())
            });
        let manifest_xml = manifest.to_xml()?;

        Ok(DeployPackage {
            manifest,
            manifest_xml,
            files: self.files,
        })
    }
}

fn check_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(package_error("path must not be empty"));
    }
    if path.starts_with('/') {
        return Err(package_error(format!("path '{path}' must be relative")));
    }
    if path.contains('\\') {
        return Err(package_error(format!("path '{path}' must use forward slashes")));
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(package_error(format!("path '{path}' must not contain '..'")));
    }
    if path.eq_ignore_ascii_case(MANIFEST_PATH) {
        return Err(package_error(format!("path '{MANIFEST_PATH}' is reserved for the manifest")));
    }
    Ok(())
}

/// A validated, immutable deploy package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployPackage {
    manifest: PackageManifest,
    manifest_xml: String,
    files: BTreeMap<String, String>,
}

impl DeployPackage {
    pub fn manifest(&self) -> &PackageManifest {
        &self.manifest
    }

    pub fn manifest_xml(&self) -> &str {
        &self.manifest_xml
    }

    pub fn member_count(&self) -> usize {
        self.manifest.member_count()
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    /// Archive entries in order: manifest first, then documents by path.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((MANIFEST_PATH, self.manifest_xml.as_str()))
            .chain(self.files.iter().map(|(p, c)| (p.as_str(), c.as_str())))
    }

    /// Document paths, excluding the manifest.
    pub fn paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Deflated zip archive with fixed entry timestamps.
    pub fn to_zip(&self) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, content) in self.entries() {
            zip.start_file(path, options)?;
            zip.write_all(content.as_bytes())?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

/// Build a zipped package from explicit members and files.
pub fn build_package<M, F>(members: M, files: F, version: &str) -> Result<Vec<u8>>
where
    M: IntoIterator<Item = (String, MetadataKind)>,
    F: IntoIterator<Item = (String, String)>,
{
    let builder = members
        .into_iter()
        .fold(PackageBuilder::new(version), |b, (name, kind)| b.member(kind, name));
    let builder = files
        .into_iter()
        .try_fold(builder, |b, (path, content)| b.file(path, content))?;
    builder.build()?.to_zip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::test_support::parse;
    use crate::descriptor::{ApexClassDescriptor, ComponentDescriptor, FieldDescriptor, FieldType};
    use crate::error::ErrorKind;
    use std::io::Read;
    use zip::ZipArchive;

    fn assert_package_error<T: std::fmt::Debug>(result: Result<T>) {
        let err = result.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Package(_)), "{err}");
    }

    fn archive_entries(bytes: &[u8]) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = String::new();
                file.read_to_string(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    fn class_package() -> DeployPackage {
        let class = ApexClassDescriptor::new("Greeter", "public class Greeter {}").unwrap();
        PackageBuilder::new("62.0")
            .descriptor(&class)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_manifest_xml() {
        let manifest = PackageManifest::new("62.0")
            .add_type("ApexClass", vec!["A".into(), "B".into()])
            .add_type("CustomField", vec!["Account.Tier__c".into()]);
        assert_eq!(manifest.member_count(), 3);

        let doc = parse(&manifest.to_xml().unwrap());
        assert_eq!(doc.root, "Package");
        assert_eq!(doc.all("types/members"), vec!["A", "B", "Account.Tier__c"]);
        assert_eq!(doc.all("types/name"), vec!["ApexClass", "CustomField"]);
        assert_eq!(doc.get("version"), Some("62.0"));
        assert_eq!(doc.leaves.last().map(|(p, _)| p.as_str()), Some("version"));
    }

    #[test]
    fn test_archive_layout() {
        let package = class_package();
        let bytes = package.to_zip().unwrap();
        let entries = archive_entries(&bytes);

        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["package.xml", "classes/Greeter.cls", "classes/Greeter.cls-meta.xml"]
        );
        assert_eq!(entries[1].1, "public class Greeter {}");

        let manifest = parse(&entries[0].1);
        assert_eq!(manifest.get("types/members"), Some("Greeter"));
        assert_eq!(manifest.get("types/name"), Some("ApexClass"));
    }

    #[test]
    fn test_archive_is_deterministic() {
        let first = class_package().to_zip().unwrap();
        let second = class_package().to_zip().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_kinds_sorted_and_members_deduplicated() {
        let field = FieldDescriptor::new("Account", "Tier", "Tier", FieldType::Text).unwrap();
        let bundle = ComponentDescriptor::with_default_templates("tierBadge").unwrap();
        let package = PackageBuilder::new("62.0")
            .descriptor(&bundle)
            .unwrap()
            .descriptor(&field)
            .unwrap()
            .member(MetadataKind::CustomField, "Account.Tier__c")
            .build()
            .unwrap();

        let names: Vec<_> = package.manifest().types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["CustomField", "LightningComponentBundle"]);
        assert_eq!(package.member_count(), 2);
        assert_eq!(package.entries().next().map(|(p, _)| p), Some("package.xml"));
    }

    #[test]
    fn test_member_count_matches_manifest() {
        let names = ["Alpha", "Beta", "Gamma", "Beta"];
        let mut builder = PackageBuilder::new("62.0");
        for name in names {
            builder = builder.member(MetadataKind::ApexClass, name);
        }
        for name in ["Alpha", "Beta", "Gamma"] {
            builder = builder
                .file(format!("classes/{name}.cls"), "public class X {}")
                .unwrap();
        }
        let package = builder.build().unwrap();
        assert_eq!(package.member_count(), 3);
        assert_eq!(package.paths().len(), 3);
    }

    #[test]
    fn test_rejects_empty_package() {
        assert_package_error(PackageBuilder::new("62.0").build());
        assert_package_error(
            PackageBuilder::new("62.0")
                .member(MetadataKind::ApexClass, "Greeter")
                .build(),
        );
        assert_package_error(
            PackageBuilder::new("62.0")
                .file("classes/Greeter.cls", "x")
                .unwrap()
                .build(),
        );
    }

    #[test]
    fn test_rejects_bad_paths() {
        let builder = || PackageBuilder::new("62.0").member(MetadataKind::ApexClass, "A");

        assert_package_error(builder().file("", "x"));
        assert_package_error(builder().file("/classes/A.cls", "x"));
        assert_package_error(builder().file("classes/../A.cls", "x"));
        assert_package_error(builder().file("classes\\A.cls", "x"));
        assert_package_error(builder().file("package.xml", "x"));
    }

    #[test]
    fn test_rejects_case_insensitive_collision() {
        let result = PackageBuilder::new("62.0")
            .member(MetadataKind::ApexClass, "A")
            .file("classes/A.cls", "x")
            .unwrap()
            .file("classes/a.cls", "y");
        assert_package_error(result);
    }

    #[test]
    fn test_rejects_path_outside_declared_kinds() {
        let result = PackageBuilder::new("62.0")
            .member(MetadataKind::ApexClass, "A")
            .file("objects/Account.object", "x")
            .unwrap()
            .build();
        assert_package_error(result);
    }

    #[test]
    fn test_build_package_function() {
        let bytes = build_package(
            vec![("Greeter".to_string(), MetadataKind::ApexClass)],
            vec![("classes/Greeter.cls".to_string(), "public class Greeter {}".to_string())],
            "62.0",
        )
        .unwrap();
        let entries = archive_entries(&bytes);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "package.xml");

        assert_package_error(build_package(
            vec![("Greeter".to_string(), MetadataKind::ApexClass)],
            Vec::new(),
            "62.0",
        ));
    }
}
