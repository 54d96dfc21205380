//! Transport-neutral request and response types
//!
//! The core never touches an HTTP library directly. It describes requests
//! with [`HttpRequest`] and interprets [`HttpResponse`] values handed back by
//! whichever transport adapter is plugged in.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, SocialContextError};

/// HTTP methods used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API version prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApiVersion {
    /// No prefix, paths hang directly off the API root
    #[serde(rename = "")]
    Root,
    #[default]
    #[serde(rename = "v0.1a")]
    V0_1a,
    #[serde(rename = "v0.1")]
    V0_1,
}

impl ApiVersion {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Root => "",
            Self::V0_1a => "v0.1a",
            Self::V0_1 => "v0.1",
        }
    }

    /// Join the API root, this version and a resource path.
    pub fn url(&self, api_root: &str, path: &str) -> String {
        let root = api_root.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        match self {
            Self::Root => format!("{root}/{path}"),
            _ => format!("{root}/{}/{path}", self.prefix()),
        }
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs
    Form(Vec<(String, String)>),
}

/// Description of a single resource call, before authentication is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: String,
    pub version: ApiVersion,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, version: ApiVersion, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), version, query: Vec::new(), body: None }
    }

    pub fn get(version: ApiVersion, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, version, path)
    }

    pub fn post(version: ApiVersion, path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, version, path).with_body(body)
    }

    pub fn put(version: ApiVersion, path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, version, path).with_body(body)
    }

    pub fn delete(version: ApiVersion, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, version, path)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Resolve the descriptor against an API root into a concrete request.
    pub fn into_request(self, api_root: &str) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.version.url(api_root, &self.path),
            headers: Vec::new(),
            query: self.query,
            body: self.body.map(RequestBody::Json),
        }
    }
}

/// Concrete HTTP request handed to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), query: Vec::new(), body: None }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Look up a header value (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Response returned by a transport
#[derive(Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    /// Build a response carrying a JSON body.
    pub fn with_json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Turn a non-2xx response into `RequestFailed`.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let body = self.text();
        let detail = body.trim();
        Err(SocialContextError::RequestFailed(if detail.is_empty() {
            format!("service returned status {}", self.status)
        } else {
            format!("service returned status {}: {detail}", self.status)
        }))
    }

    /// Deserialize the body as JSON.
    ///
    /// An empty body deserializes from `null`, so `()` and `Option<T>`
    /// targets accept 204 responses.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            return serde_json::from_value(Value::Null).map_err(|_| {
                SocialContextError::RequestFailed(format!(
                    "empty response body (status {}) cannot be decoded",
                    self.status
                ))
            });
        }

        serde_json::from_slice(&self.body).map_err(|e| {
            SocialContextError::RequestFailed(format!("failed to parse response: {e}"))
        })
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn version_urls_join_cleanly() {
        let root = "https://beta.socialcontext.ai/";
        assert_eq!(ApiVersion::V0_1a.url(root, "/jobs"), "https://beta.socialcontext.ai/v0.1a/jobs");
        assert_eq!(ApiVersion::V0_1.url(root, "token"), "https://beta.socialcontext.ai/v0.1/token");
        assert_eq!(
            ApiVersion::Root.url(root, "docs/openapi.json"),
            "https://beta.socialcontext.ai/docs/openapi.json"
        );
    }

    #[test]
    fn descriptor_resolves_to_request() {
        let request = RequestDescriptor::post(ApiVersion::V0_1a, "news/classify", json!({"a": 1}))
            .with_query("page", "2")
            .into_request("http://localhost:9000");

        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://localhost:9000/v0.1a/news/classify");
        assert_eq!(request.query, vec![("page".to_string(), "2".to_string())]);
        assert_eq!(request.body, Some(RequestBody::Json(json!({"a": 1}))));
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let request = HttpRequest::new(HttpMethod::Get, "http://x").header("Authorization", "t");
        assert_eq!(request.header_value("authorization"), Some("t"));
        assert_eq!(request.header_value("content-type"), None);
    }

    #[test]
    fn response_json_handles_empty_body() {
        let response = HttpResponse::new(204, Vec::new());
        assert!(response.json::<()>().is_ok());

        let value: Option<Value> = response.json().unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn error_for_status_keeps_success() {
        assert!(HttpResponse::new(201, "{}").error_for_status().is_ok());

        let err = HttpResponse::new(500, "boom").error_for_status().unwrap_err();
        assert_eq!(err, SocialContextError::RequestFailed("service returned status 500: boom".into()));
    }

    #[test]
    fn response_json_reports_parse_errors() {
        let response = HttpResponse::new(200, "not json");
        let result: Result<Value> = response.json();
        assert!(matches!(result, Err(SocialContextError::RequestFailed(_))));
    }
}
