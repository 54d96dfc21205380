//! Error types used throughout the client
//!
//! Every public operation in the workspace reports failures through
//! [`SocialContextError`]. Adapter-specific errors (transport, storage,
//! encryption) are converted into one of these variants at the port boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for socialcontext operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SocialContextError {
    /// Malformed caller input, detected before any network call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The client-credentials exchange itself failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The service explicitly denied an authenticated operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transport or network level failure.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The local token store could not be decrypted or deserialized.
    #[error("Token store corrupted: {0}")]
    StoreCorrupted(String),

    /// The local token store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SocialContextError {
    /// Stable label suitable for structured logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::Unauthorized(_) => "unauthorized",
            Self::RequestFailed(_) => "request_failed",
            Self::StoreCorrupted(_) => "store_corrupted",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
        }
    }

    /// Whether the error was raised locally without contacting the service.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest(_) | Self::StoreCorrupted(_) | Self::Storage(_) | Self::Config(_)
        )
    }
}

impl From<serde_json::Error> for SocialContextError {
    fn from(err: serde_json::Error) -> Self {
        Self::RequestFailed(format!("JSON error: {err}"))
    }
}

/// Result type alias for socialcontext operations
pub type Result<T> = std::result::Result<T, SocialContextError>;
