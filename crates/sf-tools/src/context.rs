//! Shared state handed to every tool call.

use std::sync::Arc;

use busbar_sf_auth::{Credentials, SessionStore};
use busbar_sf_client::{ClientConfig, SalesforceClient};
use busbar_sf_metadata::{DeployMonitor, MetadataClient};
use serde_json::Value;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::Result;

/// Session store plus server settings. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ToolContext {
    sessions: Arc<SessionStore>,
    config: ServerConfig,
    client_config: ClientConfig,
}

impl ToolContext {
    pub fn new(sessions: Arc<SessionStore>, config: ServerConfig) -> Self {
        Self {
            sessions,
            config,
            client_config: ClientConfig::default(),
        }
    }

    /// Override HTTP settings for clients built from this context.
    pub fn with_client_config(mut self, client_config: ClientConfig) -> Self {
        self.client_config = client_config;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Clients bound to the current session. Fails with `NotAuthenticated`
    /// when no session is established.
    pub async fn connect(&self) -> Result<Connection> {
        let credentials = self.sessions.credentials().await?;
        let client = SalesforceClient::with_config(
            credentials.instance_url(),
            credentials.access_token(),
            self.client_config.clone(),
        )?
        .with_api_version(&self.config.api_version);

        Ok(Connection {
            metadata: MetadataClient::from_client(client.clone()),
            client,
            config: self.config.clone(),
        })
    }
}

/// Which query endpoint answers an existence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    Rest,
    Tooling,
}

/// Clients for one tool invocation.
#[derive(Debug, Clone)]
pub struct Connection {
    client: SalesforceClient,
    metadata: MetadataClient,
    config: ServerConfig,
}

impl Connection {
    pub fn client(&self) -> &SalesforceClient {
        &self.client
    }

    pub fn metadata(&self) -> &MetadataClient {
        &self.metadata
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn monitor(&self) -> DeployMonitor {
        self.metadata.monitor(self.config.poll)
    }

    /// First record matching `soql`, if any.
    pub async fn find_one(&self, scope: QueryScope, soql: &str) -> Result<Option<Value>> {
        debug!(?scope, soql, "Existence check");
        let result = match scope {
            QueryScope::Rest => self.client.query::<Value>(soql).await?,
            QueryScope::Tooling => self.client.tooling_query::<Value>(soql).await?,
        };
        Ok(result.records.into_iter().next())
    }
}
