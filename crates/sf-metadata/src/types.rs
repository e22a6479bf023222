//! Common types for the metadata deploy pipeline.

use serde::{Deserialize, Serialize};

/// Default Metadata API version.
pub const DEFAULT_API_VERSION: &str = "62.0";

/// Namespace carried by every metadata document root.
pub const METADATA_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";

/// Fixed archive path of the package manifest.
pub const MANIFEST_PATH: &str = "package.xml";

/// Metadata kinds this crate can package.
///
/// Variants are declared in name order; manifests rely on the derived `Ord`
/// to list kinds alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetadataKind {
    ApexClass,
    CustomField,
    CustomObject,
    LightningComponentBundle,
}

impl MetadataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKind::ApexClass => "ApexClass",
            MetadataKind::CustomField => "CustomField",
            MetadataKind::CustomObject => "CustomObject",
            MetadataKind::LightningComponentBundle => "LightningComponentBundle",
        }
    }

    /// Archive directory holding documents of this kind.
    pub fn directory(&self) -> &'static str {
        match self {
            MetadataKind::ApexClass => "classes",
            MetadataKind::CustomField | MetadataKind::CustomObject => "objects",
            MetadataKind::LightningComponentBundle => "lwc",
        }
    }
}

impl std::fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test level for deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TestLevel {
    /// No tests run. Only valid outside production orgs.
    #[default]
    NoTestRun,
    RunLocalTests,
    RunAllTestsInOrg,
    /// Run the tests named in `DeployOptions::run_tests`.
    RunSpecifiedTests,
}

impl std::fmt::Display for TestLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestLevel::NoTestRun => write!(f, "NoTestRun"),
            TestLevel::RunLocalTests => write!(f, "RunLocalTests"),
            TestLevel::RunAllTestsInOrg => write!(f, "RunAllTestsInOrg"),
            TestLevel::RunSpecifiedTests => write!(f, "RunSpecifiedTests"),
        }
    }
}
