//! Authenticated Salesforce client with typed JSON helpers.
//!
//! The access token is redacted in Debug output and skipped in tracing spans.

use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::client::SfHttpClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::{MultipartPart, RequestBuilder};
use crate::DEFAULT_API_VERSION;

/// Salesforce API client bound to one org and one API version.
///
/// ```rust,ignore
/// let client = SalesforceClient::new(instance_url, token)?.with_api_version("62.0");
/// let classes: QueryResult<serde_json::Value> =
///     client.tooling_query("SELECT Id FROM ApexClass").await?;
/// ```
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let http = SfHttpClient::new(config)?;
        Ok(Self {
            http,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g., "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Resolve a path against the instance URL. Absolute URLs pass through.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.instance_url, path)
        } else {
            format!("{}/{}", self.instance_url, path)
        }
    }

    /// `rest_url("sobjects/Account")` -> `{instance}/services/data/v62.0/sobjects/Account`
    pub fn rest_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    /// `tooling_url("query")` -> `{instance}/services/data/v62.0/tooling/query`
    pub fn tooling_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/tooling/{}",
            self.instance_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    /// Metadata REST resources, e.g. `metadata_rest_url("deployRequest")`.
    pub fn metadata_rest_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}/metadata/{}",
            self.instance_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url).bearer_auth(&self.access_token)
    }

    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.http.patch(url).bearer_auth(&self.access_token)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.http.delete(url).bearer_auth(&self.access_token)
    }

    /// Execute a request and return the checked response.
    pub async fn execute(&self, request: RequestBuilder) -> Result<crate::Response> {
        self.http.execute(request).await
    }

    /// GET with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let request = self.get(&self.url(url));
        self.http.execute(request).await?.json().await
    }

    /// POST a JSON body and deserialize the JSON response.
    #[instrument(skip(self, body), fields(url = %url))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.post(&self.url(url)).json(body)?;
        self.http.execute(request).await?.json().await
    }

    /// POST to the REST API, e.g. `rest_post("sobjects/FieldPermissions", &body)`.
    pub async fn rest_post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        self.post_json(&self.rest_url(path), body).await
    }

    /// POST a multipart body exactly once.
    ///
    /// Never retried: callers use this for submissions that create remote
    /// jobs.
    #[instrument(skip(self, parts), fields(url = %url, parts = parts.len()))]
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: &str,
        parts: Vec<MultipartPart>,
    ) -> Result<T> {
        let request = self.post(&self.url(url)).multipart(parts).no_retry();
        self.http.execute(request).await?.json().await
    }

    /// Execute a SOQL query via the REST API. Returns the first page only.
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let url = format!("{}?q={}", self.rest_url("query"), urlencoding::encode(soql));
        self.get_json(&url).await
    }

    /// Execute a SOQL query via the Tooling API. Returns the first page only.
    pub async fn tooling_query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let url = format!("{}?q={}", self.tooling_url("query"), urlencoding::encode(soql));
        self.get_json(&url).await
    }
}

/// Result of a SOQL query.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct QueryResult<T> {
    #[serde(rename = "totalSize")]
    pub total_size: u64,

    /// Whether all records are returned (no more pages).
    pub done: bool,

    #[serde(rename = "nextRecordsUrl", default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,

    pub records: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_url_building() {
        let client = SalesforceClient::new("https://na1.salesforce.com", "token123").unwrap();

        assert_eq!(
            client.url("/services/oauth2/revoke"),
            "https://na1.salesforce.com/services/oauth2/revoke"
        );
        assert_eq!(client.url("https://other.com/path"), "https://other.com/path");
        assert_eq!(
            client.rest_url("sobjects/FieldPermissions"),
            "https://na1.salesforce.com/services/data/v62.0/sobjects/FieldPermissions"
        );
        assert_eq!(
            client.tooling_url("query"),
            "https://na1.salesforce.com/services/data/v62.0/tooling/query"
        );
        assert_eq!(
            client.metadata_rest_url("deployRequest/0Af000000000001"),
            "https://na1.salesforce.com/services/data/v62.0/metadata/deployRequest/0Af000000000001"
        );
    }

    #[test]
    fn test_api_version_and_trailing_slash() {
        let client = SalesforceClient::new("https://na1.salesforce.com/", "token")
            .unwrap()
            .with_api_version("60.0");

        assert_eq!(client.instance_url(), "https://na1.salesforce.com");
        assert_eq!(
            client.rest_url("limits"),
            "https://na1.salesforce.com/services/data/v60.0/limits"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = SalesforceClient::new("https://na1.salesforce.com", "00Dsecret!token").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("00Dsecret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_tooling_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/tooling/query"))
            .and(query_param("q", "SELECT Id FROM ApexClass WHERE Name = 'Foo'"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalSize": 1,
                "done": true,
                "records": [{"Id": "01p000000000001AAA"}]
            })))
            .mount(&server)
            .await;

        let client = SalesforceClient::new(server.uri(), "tok").unwrap();
        let result: QueryResult<serde_json::Value> = client
            .tooling_query("SELECT Id FROM ApexClass WHERE Name = 'Foo'")
            .await
            .unwrap();

        assert_eq!(result.total_size, 1);
        assert!(result.next_records_url.is_none());
        assert_eq!(result.records[0]["Id"], "01p000000000001AAA");
    }

    #[tokio::test]
    async fn test_post_multipart_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/data/v62.0/metadata/deployRequest"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = SalesforceClient::new(server.uri(), "tok").unwrap();
        let url = client.metadata_rest_url("deployRequest");
        let result: Result<serde_json::Value> = client
            .post_multipart(
                &url,
                vec![MultipartPart::file("file", "a.zip", "application/zip", vec![1u8])],
            )
            .await;

        assert!(result.is_err());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
