//! Credentials trait and implementations.
//!
//! All credential types implement custom Debug to redact sensitive data.

use crate::error::{Error, ErrorKind, Result};
use crate::oauth::{OAuthClient, OAuthConfig};

/// Trait for Salesforce credentials.
pub trait Credentials: Send + Sync {
    fn instance_url(&self) -> &str;

    fn access_token(&self) -> &str;

    /// API version (e.g., "62.0").
    fn api_version(&self) -> &str;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.access_token().is_empty()
    }
}

/// Standard Salesforce credentials implementation.
#[derive(Clone)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    api_version: String,
    refresh_token: Option<String>,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SalesforceCredentials {
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Set a new access token (e.g., after refresh).
    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
    }

    pub(crate) fn set_instance_url(&mut self, url: impl Into<String>) {
        self.instance_url = url.into();
    }

    /// Load credentials from environment variables.
    ///
    /// Required: `SF_INSTANCE_URL`, `SF_ACCESS_TOKEN`.
    /// Optional: `SF_API_VERSION` (default "62.0"), `SF_REFRESH_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let instance_url = std::env::var("SF_INSTANCE_URL")
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_INSTANCE_URL".to_string())))?;

        let access_token = std::env::var("SF_ACCESS_TOKEN")
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_ACCESS_TOKEN".to_string())))?;

        let api_version = std::env::var("SF_API_VERSION")
            .unwrap_or_else(|_| busbar_sf_client::DEFAULT_API_VERSION.to_string());

        let creds = Self::new(instance_url, access_token, api_version);
        Ok(match std::env::var("SF_REFRESH_TOKEN") {
            Ok(rt) if !rt.is_empty() => creds.with_refresh_token(rt),
            _ => creds,
        })
    }

    /// Obtain an access token for an SFDX auth URL (see [`SfdxAuthUrl`]).
    pub async fn from_sfdx_auth_url(auth_url: &str) -> Result<Self> {
        let parsed = SfdxAuthUrl::parse(auth_url)?;

        let token_response = parsed
            .oauth_client()
            .refresh_token(&parsed.refresh_token, parsed.login_url())
            .await
            .map_err(|e| match e.kind {
                ErrorKind::OAuth { ref error, .. } if error == "invalid_grant" => {
                    Error::new(ErrorKind::OAuth {
                        error: "invalid_grant".to_string(),
                        description: format!(
                            "Refresh token expired or invalid. Generate a fresh SF_AUTH_URL with \
                             `sf org display --verbose --json`. Original error: {}",
                            e
                        ),
                    })
                }
                _ => e,
            })?;

        Ok(Self::new(
            token_response.instance_url,
            token_response.access_token,
            busbar_sf_client::DEFAULT_API_VERSION,
        )
        .with_refresh_token(parsed.refresh_token))
    }

    /// Base REST API URL for this org.
    pub fn rest_api_url(&self) -> String {
        format!(
            "{}/services/data/v{}",
            self.instance_url.trim_end_matches('/'),
            self.api_version
        )
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}

/// A parsed SFDX auth URL.
///
/// Formats accepted:
/// - `force://<client_id>:<client_secret>:<refresh_token>@<instance_url>`
/// - `force://<client_id>::<refresh_token>@<instance_url>` (no secret)
/// - `force://<client_id>:<client_secret>:<refresh_token>:<username>@<instance_url>`
#[derive(Clone)]
pub struct SfdxAuthUrl {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: String,
    pub username: Option<String>,
    pub instance_url: String,
}

impl std::fmt::Debug for SfdxAuthUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SfdxAuthUrl")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &"[REDACTED]")
            .field("username", &self.username)
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

impl SfdxAuthUrl {
    pub fn parse(auth_url: &str) -> Result<Self> {
        let rest = auth_url.strip_prefix("force://").ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput(
                "Auth URL must start with force://".to_string(),
            ))
        })?;

        let (credentials_part, instance_url) = rest.split_once('@').ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput(
                "Invalid auth URL format: missing @".to_string(),
            ))
        })?;

        let cred_parts: Vec<&str> = credentials_part.splitn(4, ':').collect();
        if cred_parts.len() < 3 || cred_parts[0].is_empty() || cred_parts[2].is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "Invalid auth URL format: expected client_id:client_secret:refresh_token[:username]"
                    .to_string(),
            )));
        }

        Ok(Self {
            client_id: cred_parts[0].to_string(),
            client_secret: Some(cred_parts[1])
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            refresh_token: cred_parts[2].to_string(),
            username: cred_parts.get(3).map(|s| s.to_string()),
            instance_url: instance_url.trim_end_matches('/').to_string(),
        })
    }

    /// Token endpoint host for this org.
    ///
    /// Local test servers are used directly; sandboxes and scratch orgs go
    /// through test.salesforce.com, everything else through production.
    pub fn login_url(&self) -> &str {
        let url = self.instance_url.as_str();
        if url.contains("localhost") || url.contains("127.0.0.1") {
            url
        } else if url.contains("test.salesforce.com")
            || url.contains("sandbox")
            || url.contains(".scratch.")
        {
            crate::SANDBOX_LOGIN_URL
        } else {
            crate::PRODUCTION_LOGIN_URL
        }
    }

    pub fn oauth_config(&self) -> OAuthConfig {
        let config = OAuthConfig::new(&self.client_id);
        match self.client_secret {
            Some(ref secret) => config.with_secret(secret),
            None => config,
        }
    }

    pub(crate) fn oauth_client(&self) -> OAuthClient {
        OAuthClient::new(self.oauth_config())
    }
}
