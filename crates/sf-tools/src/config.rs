//! Runtime configuration read from the environment.

use std::time::Duration;

use busbar_sf_metadata::{PollConfig, DEFAULT_API_VERSION};

use crate::error::{Error, ErrorKind, Result};

/// Deploy timeout in seconds.
pub const ENV_DEPLOY_TIMEOUT: &str = "SF_DEPLOY_TIMEOUT_SECS";
/// Delay between deploy status requests, in seconds.
pub const ENV_POLL_INTERVAL: &str = "SF_DEPLOY_POLL_INTERVAL_SECS";
pub const ENV_API_VERSION: &str = "SF_API_VERSION";
/// Permission set that receives access to newly created fields.
pub const ENV_PERMISSION_SET: &str = "SF_PERMISSION_SET";
pub const ENV_LOGIN_URL: &str = "SF_LOGIN_URL";

/// Settings shared by every tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub poll: PollConfig,
    pub api_version: String,
    /// `None` targets the permission set owned by the System Administrator
    /// profile.
    pub permission_set: Option<String>,
    pub login_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            permission_set: None,
            login_url: busbar_sf_auth::PRODUCTION_LOGIN_URL.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let timeout = match get(ENV_DEPLOY_TIMEOUT) {
            Some(v) => Duration::from_secs(parse_secs(ENV_DEPLOY_TIMEOUT, &v)?),
            None => defaults.poll.timeout,
        };
        let interval = match get(ENV_POLL_INTERVAL) {
            Some(v) => Duration::from_secs(parse_secs(ENV_POLL_INTERVAL, &v)?),
            None => defaults.poll.interval,
        };
        if interval.is_zero() {
            return Err(Error::new(ErrorKind::Config(format!(
                "{ENV_POLL_INTERVAL} must be at least 1 second"
            ))));
        }

        let api_version = get(ENV_API_VERSION)
            .map(|v| v.trim().trim_start_matches('v').to_string())
            .unwrap_or(defaults.api_version);
        if api_version.parse::<f32>().is_err() {
            return Err(Error::new(ErrorKind::Config(format!(
                "{ENV_API_VERSION} must look like 62.0, got '{api_version}'"
            ))));
        }

        Ok(Self {
            poll: PollConfig::new(timeout, interval),
            api_version,
            permission_set: get(ENV_PERMISSION_SET).map(|v| v.trim().to_string()),
            login_url: get(ENV_LOGIN_URL)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.login_url),
        })
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_permission_set(mut self, name: impl Into<String>) -> Self {
        self.permission_set = Some(name.into());
        self
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|e| {
        Error::with_source(
            ErrorKind::Config(format!("{key} must be a whole number of seconds, got '{value}'")),
            e,
        )
    })
}
