//! Error types for sf-metadata.

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

    /// True when the underlying transport failure is transient and the same
    /// read may be attempted again.
    pub fn is_retryable(&self) -> bool {
        self.source
            .as_ref()
            .and_then(|s| s.downcast_ref::<busbar_sf_client::Error>())
            .is_some_and(|e| e.is_retryable())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Identifier violates the platform naming grammar.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Descriptor is missing a required attribute or carries one its type
    /// does not allow.
    #[error("Invalid descriptor: {0}")]
    Descriptor(String),

    #[error("Invalid package: {0}")]
    Package(String),

    /// Deploy submission failed; no job was created.
    #[error("Deploy submission failed: {0}")]
    Submission(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Archive error: {0}")]
    Zip(String),
}

impl From<busbar_sf_client::Error> for Error {
    fn from(err: busbar_sf_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.to_string()), err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::with_source(ErrorKind::Zip(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Zip(err.to_string()), err)
    }
}

pub(crate) fn descriptor_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Descriptor(message.into()))
}

pub(crate) fn package_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Package(message.into()))
}
