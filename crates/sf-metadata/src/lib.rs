//! # busbar-sf-metadata
//!
//! Generate Salesforce metadata documents, package them and deploy them
//! through the Metadata REST API.
//!
//! ## Features
//!
//! - **Naming** - Identifier grammar for classes, bundles, objects and fields
//! - **Descriptors** - Field, object, Apex class and LWC bundle documents
//! - **Packaging** - Deterministic zip packages with a generated `package.xml`
//! - **Deploy** - Multipart `deployRequest` submission
//! - **Status Polling** - Bounded polling with per-component results
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_metadata::{
//!     DeployMode, FieldDescriptor, FieldType, MetadataClient, PackageBuilder, PollConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_metadata::Error> {
//!     let client = MetadataClient::new("https://myorg.my.salesforce.com", "token")?;
//!
//!     let field = FieldDescriptor::new("Account", "Tier", "Tier", FieldType::Picklist)?
//!         .with_picklist_values(["Gold", "Silver"]);
//!     let package = PackageBuilder::new(client.api_version())
//!         .descriptor(&field)?
//!         .build()?;
//!
//!     let job = client.submit(&package, DeployMode::Commit).await?;
//!     let outcome = client.monitor(PollConfig::default()).poll(&job.id).await;
//!     println!("Deploy {}: {}", job.id, outcome.state);
//!     Ok(())
//! }
//! ```

mod client;
mod deploy;
pub mod descriptor;
mod error;
pub mod naming;
mod package;
mod types;

pub use client::{DeployMonitor, MetadataClient, PollConfig};
pub use deploy::{
    ComponentFailure, ComponentResult, ComponentSuccess, DeployDetails, DeployJob, DeployMode,
    DeployOptions, DeployOutcome, DeployResult, DeployState, DeployStatusResponse,
};
pub use descriptor::{
    ApexClassDescriptor, ComponentDescriptor, Descriptor, DocumentFile, FieldDescriptor,
    FieldType, ObjectDescriptor,
};
pub use error::{Error, ErrorKind, Result};
pub use package::{build_package, DeployPackage, PackageBuilder, PackageManifest, PackageTypeMembers};
pub use types::{MetadataKind, TestLevel, DEFAULT_API_VERSION, MANIFEST_PATH, METADATA_NAMESPACE};
