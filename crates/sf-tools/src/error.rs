//! Error types for sf-tools.
//!
//! Every kind maps onto one failure class a tool caller can act on; see
//! [`crate::ToolResponse::from_error`] for how they reach the caller.

use busbar_sf_metadata::{ComponentFailure, DeployState};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation(message.into()))
    }

    /// True when calling again may succeed: a timed-out deploy can be
    /// re-queried, a transient read can be repeated.
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            ErrorKind::TimedOut { .. } => true,
            ErrorKind::Query(_) => self.source.as_ref().is_some_and(|s| {
                s.downcast_ref::<busbar_sf_client::Error>()
                    .is_some_and(|e| e.is_retryable())
                    || s.downcast_ref::<busbar_sf_metadata::Error>()
                        .is_some_and(|e| e.is_retryable())
            }),
            _ => false,
        }
    }

    /// Short machine-readable name of the failure class.
    pub fn error_type(&self) -> &'static str {
        match &self.kind {
            ErrorKind::Validation(_) => "ValidationError",
            ErrorKind::Conflict(_) => "ConflictError",
            ErrorKind::NotFound(_) => "NotFoundError",
            ErrorKind::Submission(_) => "SubmissionError",
            ErrorKind::TimedOut { .. } => "TimedOut",
            ErrorKind::DeployFailure { .. } => "DeployFailure",
            ErrorKind::Query(_) => "QueryError",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Config(_) => "ConfigError",
            ErrorKind::Internal(_) => "InternalError",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Malformed identifier or descriptor attribute. Never sent over the wire.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A create found the entity already present.
    #[error("Already exists: {0}")]
    Conflict(String),

    /// An update found no entity to change.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The deploy request was rejected before a job existed.
    #[error("Deploy submission failed: {0}")]
    Submission(String),

    /// Polling budget ran out without a terminal status; the job may
    /// still finish remotely. `last_error` is the last failed status read.
    #[error("Deploy {job_id} did not reach a final state within the polling window")]
    TimedOut {
        job_id: String,
        last_error: Option<String>,
    },

    #[error("Deploy {job_id} ended {state}: {summary}")]
    DeployFailure {
        job_id: String,
        state: DeployState,
        failures: Vec<ComponentFailure>,
        summary: String,
    },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Not authenticated: no Salesforce session is established")]
    NotAuthenticated,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<busbar_sf_metadata::Error> for Error {
    fn from(err: busbar_sf_metadata::Error) -> Self {
        use busbar_sf_metadata::ErrorKind as Md;

        let kind = match &err.kind {
            Md::InvalidName(m) | Md::Descriptor(m) | Md::Package(m) => {
                ErrorKind::Validation(m.clone())
            }
            Md::Submission(m) => ErrorKind::Submission(m.clone()),
            Md::Client(m) => ErrorKind::Query(m.clone()),
            Md::InvalidResponse(_) | Md::Xml(_) | Md::Zip(_) => {
                ErrorKind::Internal(err.to_string())
            }
        };
        Error::with_source(kind, err)
    }
}

impl From<busbar_sf_client::Error> for Error {
    fn from(err: busbar_sf_client::Error) -> Self {
        Error::with_source(ErrorKind::Query(err.to_string()), err)
    }
}

impl From<busbar_sf_auth::Error> for Error {
    fn from(err: busbar_sf_auth::Error) -> Self {
        let kind = match &err.kind {
            busbar_sf_auth::ErrorKind::NotAuthenticated => ErrorKind::NotAuthenticated,
            _ => ErrorKind::Internal(err.to_string()),
        };
        Error::with_source(kind, err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Internal(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Internal(err.to_string()), err)
    }
}
