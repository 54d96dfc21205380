//! Credential and token types
//!
//! [`Token`] mirrors the service's OAuth2 token response. The full response
//! is kept in [`Token::raw`] so nothing the service returns is lost when the
//! token is persisted.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{Result, SocialContextError};

/// Application credential used for the client-credentials grant.
///
/// The secret is zeroed on drop and never rendered by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    client_id: String,
    client_secret: String,
}

impl Credential {
    /// Create a credential, rejecting empty identifiers or secrets.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Result<Self> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();

        if client_id.trim().is_empty() {
            return Err(SocialContextError::Config("client id must not be empty".into()));
        }
        if client_secret.is_empty() {
            return Err(SocialContextError::Config("client secret must not be empty".into()));
        }

        Ok(Self { client_id, client_secret })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Expose the secret (use with caution)
    ///
    /// The value should not be stored or logged.
    pub fn expose_secret(&self) -> &str {
        &self.client_secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// OAuth2 access token with metadata
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,

    /// Token type (the service issues "bearer")
    pub token_type: String,

    /// Absolute expiration timestamp, computed from `expires_in` on receipt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Full token response as returned by the service
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl Token {
    /// Build a token from a token endpoint JSON response.
    ///
    /// Returns `None` when the response has no usable `access_token`.
    pub fn from_response(raw: Map<String, Value>, received_at: DateTime<Utc>) -> Option<Self> {
        let access_token = raw.get("access_token")?.as_str()?.to_string();
        if access_token.is_empty() {
            return None;
        }

        let token_type =
            raw.get("token_type").and_then(Value::as_str).unwrap_or("bearer").to_string();

        let expires_at = raw
            .get("expires_in")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .filter(|secs| *secs > 0)
            .and_then(|secs| expiry_after(received_at, secs));

        let refresh_token = raw
            .get("refresh_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Some(Self { access_token, token_type, expires_at, refresh_token, raw })
    }

    /// Check whether the token has expired as of `now`.
    ///
    /// Tokens without an expiry never expire locally; the service decides.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// `received_at + secs`, or `None` when the instant is not representable.
///
/// An unrepresentable lifetime leaves the token without a local expiry.
fn expiry_after(received_at: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_seconds(secs).and_then(|lifetime| received_at.checked_add_signed(lifetime))
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}
