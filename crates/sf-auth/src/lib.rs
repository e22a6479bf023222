//! # sf-auth
//!
//! Credentials and session lifecycle for a single connected org.
//!
//! - Tokens and secrets are redacted in Debug output
//! - Tracing spans skip credential parameters
//! - [`SessionStore`] is the one place an authenticated session lives; it is
//!   created at login, shared by reference, and cleared at logout
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_auth::{Session, SessionStore};
//!
//! let store = SessionStore::new();
//! let auth_url = std::env::var("SF_AUTH_URL")?;
//! store.login(Session::from_sfdx_auth_url(&auth_url).await?).await;
//!
//! let creds = store.credentials().await?;
//! ```

mod credentials;
mod error;
mod oauth;
mod session;

pub use credentials::{Credentials, SalesforceCredentials, SfdxAuthUrl};
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse};
pub use session::{
    Session, SessionStatus, SessionStore, DEFAULT_REFRESH_AFTER, REFRESH_RETRY_AFTER,
};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
