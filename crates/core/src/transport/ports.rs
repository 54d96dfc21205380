//! Port interface for the HTTP transport

use async_trait::async_trait;
use socialcontext_domain::{HttpRequest, HttpResponse, SocialContextError};
use thiserror::Error;

/// Failure to obtain any response from the service
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No usable bearer token was available for the request
    #[error("missing or invalid access token: {0}")]
    MissingToken(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<TransportError> for SocialContextError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::MissingToken(msg) => Self::AuthenticationFailed(msg),
            other => Self::RequestFailed(other.to_string()),
        }
    }
}

/// Sends one HTTP request and returns whatever the service answered.
///
/// Non-2xx statuses are responses, not errors. Implementations report an
/// error only when no response was received.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}
