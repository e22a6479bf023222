//! # sf-client
//!
//! HTTP transport shared by the metadata deploy pipeline and the tool layer.
//!
//! - Retry with exponential backoff and jitter for idempotent requests
//! - Requests that must never be replayed (deploy submissions) opt out of retry
//! - Salesforce error bodies mapped onto a typed [`ErrorKind`]
//! - Query, Tooling query, JSON and multipart helpers on [`SalesforceClient`]
//!
//! ```text
//!   busbar-sf-tools / busbar-sf-metadata
//!                  │
//!                  ▼
//!          SalesforceClient   (instance URL, token, API version, URL helpers)
//!                  │
//!                  ▼
//!            SfHttpClient     (retry loop, status mapping, multipart bodies)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_client::SalesforceClient;
//!
//! let client = SalesforceClient::new("https://myorg.my.salesforce.com", token)?;
//! let result: QueryResult<serde_json::Value> =
//!     client.query("SELECT Id FROM ApexClass WHERE Name = 'Foo'").await?;
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod salesforce_client;
pub mod security;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{MultipartPart, RequestBuilder, RequestMethod};
pub use response::Response;
pub use retry::{RetryConfig, RetryPolicy};
pub use salesforce_client::{QueryResult, SalesforceClient};

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("busbar-sf-mcp/", env!("CARGO_PKG_VERSION"));
