//! Metadata REST deploy client.
//!
//! Wraps `SalesforceClient` from `sf-client` and exposes the two calls a
//! deployment needs: submit a package and read its status.

use busbar_sf_client::{ClientConfig, SalesforceClient};

use crate::error::Result;

mod deploy;
mod poll;

pub use poll::{DeployMonitor, PollConfig};

/// Salesforce Metadata API client.
///
/// ```rust,ignore
/// use busbar_sf_metadata::{DeployMode, MetadataClient, PackageBuilder, PollConfig};
///
/// let client = MetadataClient::new("https://myorg.my.salesforce.com", "token")?;
/// let job = client.submit(&package, DeployMode::Commit).await?;
/// let outcome = client.monitor(PollConfig::default()).poll(&job.id).await;
/// ```
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: SalesforceClient,
}

impl MetadataClient {
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        let client = SalesforceClient::new(instance_url, access_token)?;
        Ok(Self { client })
    }

    /// Create a new Metadata client with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SalesforceClient::with_config(instance_url, access_token, config)?;
        Ok(Self { client })
    }

    pub fn from_client(client: SalesforceClient) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    pub fn instance_url(&self) -> &str {
        self.client.instance_url()
    }

    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.client = self.client.with_api_version(version);
        self
    }

    /// A poller bound to this client.
    pub fn monitor(&self, config: PollConfig) -> DeployMonitor {
        DeployMonitor::new(self.clone(), config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_accessors() {
        let client = MetadataClient::new("https://na1.salesforce.com", "token")
            .unwrap()
            .with_api_version("61.0");
        assert_eq!(client.instance_url(), "https://na1.salesforce.com");
        assert_eq!(client.api_version(), "61.0");
        assert_eq!(
            client.inner().metadata_rest_url("deployRequest"),
            "https://na1.salesforce.com/services/data/v61.0/metadata/deployRequest"
        );
    }
}
