//! The authenticated session shared by every tool call.
//!
//! A [`SessionStore`] holds at most one [`Session`]. It is created empty,
//! filled by [`SessionStore::login`], read by every orchestration through
//! [`SessionStore::credentials`], and cleared by [`SessionStore::logout`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::credentials::{Credentials, SalesforceCredentials, SfdxAuthUrl};
use crate::error::{Error, ErrorKind, Result};
use crate::oauth::{OAuthClient, OAuthConfig};

/// Access tokens older than this are refreshed before use.
pub const DEFAULT_REFRESH_AFTER: Duration = Duration::from_secs(90 * 60);

/// Minimum wait after a failed refresh before trying again.
pub const REFRESH_RETRY_AFTER: Duration = Duration::from_secs(5 * 60);

/// One established org connection.
#[derive(Debug, Clone)]
pub struct Session {
    credentials: SalesforceCredentials,
    oauth: Option<OAuthConfig>,
    login_url: String,
    established_at: DateTime<Utc>,
    refreshed_at: DateTime<Utc>,
    refresh_failed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A session around an existing access token. Without
    /// [`with_oauth`](Self::with_oauth) it is never refreshed.
    pub fn new(credentials: SalesforceCredentials) -> Self {
        let now = Utc::now();
        Self {
            credentials,
            oauth: None,
            login_url: crate::PRODUCTION_LOGIN_URL.to_string(),
            established_at: now,
            refreshed_at: now,
            refresh_failed_at: None,
        }
    }

    /// Enable refresh through the given connected app and login host.
    pub fn with_oauth(mut self, config: OAuthConfig, login_url: impl Into<String>) -> Self {
        self.oauth = Some(config);
        self.login_url = login_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Exchange an SFDX auth URL for a refreshable session.
    pub async fn from_sfdx_auth_url(auth_url: &str) -> Result<Self> {
        let parsed = SfdxAuthUrl::parse(auth_url)?;
        let credentials = SalesforceCredentials::from_sfdx_auth_url(auth_url).await?;
        Ok(Self::new(credentials).with_oauth(parsed.oauth_config(), parsed.login_url()))
    }

    pub fn credentials(&self) -> &SalesforceCredentials {
        &self.credentials
    }

    pub fn established_at(&self) -> DateTime<Utc> {
        self.established_at
    }

    pub fn oauth_config(&self) -> Option<&OAuthConfig> {
        self.oauth.as_ref()
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn can_refresh(&self) -> bool {
        self.oauth.is_some() && self.credentials.refresh_token().is_some()
    }

    fn token_age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.refreshed_at).to_std().unwrap_or(Duration::ZERO)
    }

    fn needs_refresh(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        let backing_off = self.refresh_failed_at.is_some_and(|failed| {
            (now - failed).to_std().unwrap_or(Duration::ZERO) < REFRESH_RETRY_AFTER
        });
        self.can_refresh() && !backing_off && self.token_age(now) >= threshold
    }

    /// Replace the access token. A failed refresh keeps the current token
    /// and suppresses further attempts for [`REFRESH_RETRY_AFTER`].
    async fn refresh(&mut self) {
        let (Some(config), Some(refresh_token)) = (
            self.oauth.clone(),
            self.credentials.refresh_token().map(str::to_string),
        ) else {
            return;
        };

        match OAuthClient::new(config)
            .refresh_token(&refresh_token, &self.login_url)
            .await
        {
            Ok(token) => {
                self.credentials.set_access_token(token.access_token);
                self.credentials.set_instance_url(token.instance_url);
                self.refreshed_at = Utc::now();
                self.refresh_failed_at = None;
                info!(instance_url = %self.credentials.instance_url(), "Refreshed access token");
            }
            Err(e) => {
                self.refresh_failed_at = Some(Utc::now());
                warn!(
                    error = %e,
                    retry_after_secs = REFRESH_RETRY_AFTER.as_secs(),
                    "Access token refresh failed, keeping current token"
                );
            }
        }
    }
}

/// Snapshot reported by the auth-status tool.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub established_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_age_secs: Option<i64>,
    pub can_refresh: bool,
}

/// Lock-guarded holder of the current session.
#[derive(Debug)]
pub struct SessionStore {
    inner: RwLock<Option<Session>>,
    refresh_after: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
            refresh_after: DEFAULT_REFRESH_AFTER,
        }
    }

    pub fn with_refresh_after(mut self, refresh_after: Duration) -> Self {
        self.refresh_after = refresh_after;
        self
    }

    /// Install a session, replacing any previous one.
    pub async fn login(&self, session: Session) {
        info!(instance_url = %session.credentials.instance_url(), "Session established");
        *self.inner.write().await = Some(session);
    }

    /// Clear the session and hand it back so the caller may revoke it.
    pub async fn logout(&self) -> Option<Session> {
        let previous = self.inner.write().await.take();
        if previous.is_some() {
            info!("Session cleared");
        }
        previous
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }

    /// Credentials for the current session, refreshed first when stale.
    pub async fn credentials(&self) -> Result<SalesforceCredentials> {
        {
            let guard = self.inner.read().await;
            match guard.as_ref() {
                None => return Err(Error::new(ErrorKind::NotAuthenticated)),
                Some(session) if !session.needs_refresh(Utc::now(), self.refresh_after) => {
                    return Ok(session.credentials.clone());
                }
                Some(_) => {}
            }
        }

        let mut guard = self.inner.write().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| Error::new(ErrorKind::NotAuthenticated))?;

        // Another caller may have refreshed while we waited for the lock.
        if session.needs_refresh(Utc::now(), self.refresh_after) {
            session.refresh().await;
        }

        Ok(session.credentials.clone())
    }

    pub async fn status(&self) -> SessionStatus {
        let guard = self.inner.read().await;
        match guard.as_ref() {
            None => SessionStatus {
                authenticated: false,
                instance_url: None,
                api_version: None,
                established_at: None,
                session_age_secs: None,
                can_refresh: false,
            },
            Some(session) => SessionStatus {
                authenticated: true,
                instance_url: Some(session.credentials.instance_url().to_string()),
                api_version: Some(session.credentials.api_version().to_string()),
                established_at: Some(session.established_at),
                session_age_secs: Some((Utc::now() - session.established_at).num_seconds()),
                can_refresh: session.can_refresh(),
            },
        }
    }
}
