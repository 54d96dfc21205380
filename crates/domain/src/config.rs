//! Client configuration
//!
//! Every field has a default except the credential pair, which is only
//! demanded when a client actually connects (see [`ClientConfig::credential`]).

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_ROOT, DEFAULT_REAUTH_STATUSES, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use crate::errors::{Result, SocialContextError};
use crate::types::Credential;

/// Configuration for a socialcontext client
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_root: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    /// Token store location; `None` selects the per-user default
    pub token_store_path: Option<PathBuf>,
    pub timeout_secs: u64,

    /// Response statuses that trigger re-authentication
    pub reauth_statuses: Vec<u16>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            client_id: None,
            client_secret: None,
            token_store_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            reauth_statuses: DEFAULT_REAUTH_STATUSES.to_vec(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    /// Build the application credential from the configured id and secret.
    ///
    /// # Errors
    /// Returns `SocialContextError::Config` if either value is missing or
    /// empty.
    pub fn credential(&self) -> Result<Credential> {
        let client_id = self.client_id.as_deref().ok_or_else(|| {
            SocialContextError::Config("client id is not configured".to_string())
        })?;
        let client_secret = self.client_secret.as_deref().ok_or_else(|| {
            SocialContextError::Config("client secret is not configured".to_string())
        })?;

        Credential::new(client_id, client_secret)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check values that would otherwise fail at first use.
    ///
    /// # Errors
    /// Returns `SocialContextError::Config` for an unusable API root, a zero
    /// timeout or a reauth status outside the 4xx/5xx range.
    pub fn validate(&self) -> Result<()> {
        let root = self.api_root.trim();
        if !(root.starts_with("http://") || root.starts_with("https://")) {
            return Err(SocialContextError::Config(format!(
                "api root must be an http(s) URL, got '{}'",
                self.api_root
            )));
        }

        if self.timeout_secs == 0 {
            return Err(SocialContextError::Config("timeout must be positive".to_string()));
        }

        if let Some(status) = self.reauth_statuses.iter().find(|s| !(400..600).contains(*s)) {
            return Err(SocialContextError::Config(format!(
                "reauth status {status} is not an error status"
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_root", &self.api_root)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_store_path", &self.token_store_path)
            .field("timeout_secs", &self.timeout_secs)
            .field("reauth_statuses", &self.reauth_statuses)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
