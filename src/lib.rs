//! # busbar-sf-mcp
//!
//! A JSON-RPC tool server that creates and updates Salesforce metadata
//! (Apex classes, custom fields, custom objects and Lightning web
//! components) through the Metadata REST deploy API.
//!
//! ## Crates
//!
//! - **busbar-sf-client** - HTTP transport: retry, error mapping, query and multipart helpers
//! - **busbar-sf-auth** - Credentials, OAuth refresh/revoke and the session store
//! - **busbar-sf-metadata** - Name rules, document generators, package builder, deploy submit and poll
//! - **busbar-sf-tools** - Tool orchestrators, result envelopes and the JSON-RPC server
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use busbar_sf_mcp::{McpServer, ServerConfig, Session, SessionStore, ToolContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sessions = Arc::new(SessionStore::new());
//!     sessions
//!         .login(Session::from_sfdx_auth_url(&std::env::var("SF_AUTH_URL")?).await?)
//!         .await;
//!
//!     let context = ToolContext::new(sessions, ServerConfig::from_env()?);
//!     McpServer::new(context).run_stdio().await?;
//!     Ok(())
//! }
//! ```

pub use busbar_sf_auth as auth;
pub use busbar_sf_client as client;
pub use busbar_sf_metadata as metadata;
pub use busbar_sf_tools as tools;

pub use busbar_sf_auth::{Credentials, SalesforceCredentials, Session, SessionStore};
pub use busbar_sf_client::{ClientConfig, SalesforceClient};
pub use busbar_sf_metadata::{DeployOutcome, DeployState, MetadataClient, PollConfig};
pub use busbar_sf_tools::{McpServer, ServerConfig, ToolContext, ToolRegistry, ToolResponse};
