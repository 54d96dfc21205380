//! Client construction from configuration.
//!
//! Wires the reqwest transport, the client-credentials provider and the
//! encrypted SQLite store into a [`SocialContextClient`]. Callers own the
//! returned client; nothing here is global.

use std::sync::Arc;

use socialcontext_core::{
    AuthenticatedDispatcher, HttpTransport, ReauthPolicy, SocialContextClient, TokenProvider,
    TokenStore,
};
use socialcontext_domain::{ClientConfig, Result};
use tracing::info;

use crate::auth::ClientCredentialsProvider;
use crate::config::default_token_store_path;
use crate::http::ReqwestTransport;
use crate::storage::SqliteTokenStore;

/// Build a client from `config` without contacting the service.
///
/// The first request (or an explicit [`SocialContextClient::connect`])
/// acquires the token.
///
/// # Errors
/// Returns `SocialContextError::Config` for invalid configuration or
/// missing credentials.
pub fn build_client(config: &ClientConfig) -> Result<SocialContextClient> {
    config.validate()?;
    let credential = config.credential()?;

    let transport: Arc<dyn HttpTransport> = Arc::new(
        ReqwestTransport::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?,
    );

    let provider: Arc<dyn TokenProvider> =
        Arc::new(ClientCredentialsProvider::new(&config.api_root, Arc::clone(&transport)));

    let store_path = config.token_store_path.clone().unwrap_or_else(default_token_store_path);
    let store: Arc<dyn TokenStore> =
        Arc::new(SqliteTokenStore::for_credential(store_path.clone(), &credential)?);

    info!(
        api_root = %config.api_root,
        client_id = %credential.client_id(),
        token_store = %store_path.display(),
        "socialcontext client configured"
    );

    let dispatcher =
        AuthenticatedDispatcher::new(config.api_root.clone(), credential, transport, provider, store)
            .with_policy(ReauthPolicy::new(config.reauth_statuses.iter().copied()));

    Ok(SocialContextClient::new(Arc::new(dispatcher)))
}

/// Build a client and authenticate it immediately.
///
/// # Errors
/// Propagates configuration errors, `StoreCorrupted` from the token store
/// and `AuthenticationFailed` from the token endpoint.
pub async fn connect_client(config: &ClientConfig) -> Result<SocialContextClient> {
    let client = build_client(config)?;
    client.connect().await?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use socialcontext_core::DispatchState;
    use socialcontext_domain::SocialContextError;
    use tempfile::TempDir;

    use super::*;

    fn config(dir: &TempDir) -> ClientConfig {
        ClientConfig {
            api_root: "http://127.0.0.1:9".to_string(),
            client_id: Some("app".to_string()),
            client_secret: Some("secret".to_string()),
            token_store_path: Some(dir.path().join("tokens.db")),
            reauth_statuses: vec![401],
            ..ClientConfig::default()
        }
    }

    #[test]
    fn builds_unauthenticated_client_without_network() {
        let dir = TempDir::new().unwrap();
        let client = build_client(&config(&dir)).unwrap();

        let dispatcher = client.dispatcher();
        assert_eq!(dispatcher.state(), DispatchState::Unauthenticated);
        assert_eq!(dispatcher.client_id(), "app");
        assert!(dispatcher.policy().triggers(401));
        assert!(!dispatcher.policy().triggers(403));
        assert!(!dir.path().join("tokens.db").exists());
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig { client_secret: None, ..config(&dir) };

        assert!(matches!(build_client(&config), Err(SocialContextError::Config(_))));
    }

    #[test]
    fn invalid_api_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = ClientConfig { api_root: "ftp://example".to_string(), ..config(&dir) };

        assert!(matches!(build_client(&config), Err(SocialContextError::Config(_))));
    }

    #[tokio::test]
    async fn connect_reports_unreachable_token_endpoint() {
        let dir = TempDir::new().unwrap();

        let err = connect_client(&config(&dir)).await.unwrap_err();
        assert!(matches!(err, SocialContextError::AuthenticationFailed(_)));
    }
}
