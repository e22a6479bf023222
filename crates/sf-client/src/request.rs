//! HTTP request building.

use bytes::Bytes;
use serde::Serialize;

use crate::error::Result;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl RequestMethod {
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One part of a `multipart/form-data` body.
///
/// Parts are stored as owned bytes so a request can be rebuilt for every
/// attempt; `reqwest::multipart::Form` itself is consumed on send.
#[derive(Debug, Clone)]
pub struct MultipartPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

impl MultipartPart {
    /// A JSON document part.
    pub fn json(name: impl Into<String>, value: &serde_json::Value) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            file_name: None,
            content_type: "application/json".to_string(),
            data: Bytes::from(serde_json::to_vec(value)?),
        })
    }

    /// A binary file part.
    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Builder for HTTP requests.
#[derive(Debug)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) query_params: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) bearer_token: Option<String>,
    /// Whether the client may replay this request on transient failures.
    pub(crate) retryable: bool,
}

/// Request body content.
#[derive(Debug)]
pub(crate) enum RequestBody {
    Json(serde_json::Value),
    Multipart(Vec<MultipartPart>),
}

impl RequestBuilder {
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query_params: Vec::new(),
            body: None,
            bearer_token: None,
            retryable: true,
        }
    }

    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    /// Set a `multipart/form-data` body. The boundary and content type are
    /// chosen by reqwest.
    pub fn multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    /// Never replay this request, even when the client has a retry policy.
    ///
    /// Required for non-idempotent calls such as deploy submissions, where a
    /// replay after a lost response creates a second job.
    pub fn no_retry(mut self) -> Self {
        self.retryable = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = RequestBuilder::new(RequestMethod::Get, "https://example.com/query")
            .bearer_auth("token123")
            .header("Accept", "application/json")
            .query("q", "SELECT Id FROM ApexClass");

        assert_eq!(req.method, RequestMethod::Get);
        assert_eq!(req.bearer_token.as_deref(), Some("token123"));
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.query_params.len(), 1);
        assert!(req.retryable);
    }

    #[test]
    fn test_no_retry_flag() {
        let req = RequestBuilder::new(RequestMethod::Post, "https://example.com").no_retry();
        assert!(!req.retryable);
    }

    #[test]
    fn test_multipart_parts() {
        let json = MultipartPart::json("json", &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(json.content_type, "application/json");
        assert!(json.file_name.is_none());
        assert_eq!(&json.data[..], br#"{"a":1}"#);

        let file = MultipartPart::file("file", "pkg.zip", "application/zip", vec![1u8, 2, 3]);
        assert_eq!(file.file_name.as_deref(), Some("pkg.zip"));

        let req = RequestBuilder::new(RequestMethod::Post, "https://example.com")
            .multipart(vec![json, file]);
        assert!(matches!(req.body, Some(RequestBody::Multipart(ref p)) if p.len() == 2));
    }
}
