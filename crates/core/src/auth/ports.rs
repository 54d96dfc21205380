//! Port interfaces for token acquisition and persistence

use async_trait::async_trait;
use socialcontext_domain::{Credential, Result, Token};

/// Trait for obtaining access tokens from the token endpoint
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Run the client-credentials exchange.
    ///
    /// # Errors
    /// Every failure, including transport errors, is reported as
    /// `SocialContextError::AuthenticationFailed`.
    async fn fetch_token(&self, credential: &Credential) -> Result<Token>;

    /// Exchange a refresh token for a new access token.
    ///
    /// # Errors
    /// `SocialContextError::AuthenticationFailed` when the refresh is
    /// rejected; callers fall back to [`TokenProvider::fetch_token`].
    async fn refresh_token(&self, credential: &Credential, refresh_token: &str) -> Result<Token>;
}

/// Trait for the encrypted token cache, keyed by client id
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Write or overwrite the token for `client_id`.
    async fn save(&self, client_id: &str, token: &Token) -> Result<()>;

    /// Read the token for `client_id`.
    ///
    /// Returns `Ok(None)` when nothing is cached.
    ///
    /// # Errors
    /// `SocialContextError::StoreCorrupted` when a record exists but cannot be
    /// decrypted or decoded.
    async fn load(&self, client_id: &str) -> Result<Option<Token>>;

    /// Remove the token for `client_id`; a no-op if absent.
    async fn clear(&self, client_id: &str) -> Result<()>;
}
