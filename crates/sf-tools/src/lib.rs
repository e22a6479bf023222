//! # busbar-sf-tools
//!
//! Metadata deploy operations exposed as tools over JSON-RPC.
//!
//! Every create or update tool runs the same orchestration:
//!
//! ```text
//!   validate names ─► existence query ─► build package ─► submit ─► poll ─► envelope
//!        │                 │                                 │        │
//!   ValidationError   Conflict/NotFound              SubmissionError  TimedOut/DeployFailure
//! ```
//!
//! Local validation runs before any network call. A submission is sent
//! exactly once; only the status poll retries, and only on transient
//! transport errors.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use busbar_sf_auth::{Session, SessionStore};
//! use busbar_sf_tools::{McpServer, ServerConfig, ToolContext};
//!
//! let sessions = Arc::new(SessionStore::new());
//! sessions.login(Session::from_sfdx_auth_url(&auth_url).await?).await;
//!
//! let server = McpServer::new(ToolContext::new(sessions, ServerConfig::from_env()?));
//! server.run_stdio().await?;
//! ```

pub mod apex;
pub mod auth;
pub mod component;
pub mod config;
mod context;
mod envelope;
mod error;
pub mod field;
pub mod object;
mod pipeline;
pub mod protocol;
pub mod query;
mod registry;
mod server;
pub mod status;

pub use config::ServerConfig;
pub use context::{Connection, QueryScope, ToolContext};
pub use envelope::ToolResponse;
pub use error::{Error, ErrorKind, Result};
pub use field::PermissionGrant;
pub use registry::{ToolDefinition, ToolHandler, ToolRegistry};
pub use server::{McpServer, SERVER_NAME};
