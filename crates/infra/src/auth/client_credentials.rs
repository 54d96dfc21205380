//! OAuth2 client-credentials token provider
//!
//! Handles the two token calls the service supports:
//! - `POST {api_root}/v0.1/token` with `grant_type=client_credentials`
//! - `POST {api_root}/v0.1/token-refresh` with `grant_type=refresh_token`
//!
//! Each call is a single attempt. Whatever goes wrong (transport error,
//! non-2xx status, body without `access_token`) is reported as
//! `AuthenticationFailed`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use socialcontext_core::{HttpTransport, TokenProvider};
use socialcontext_domain::constants::{TOKEN_PATH, TOKEN_REFRESH_PATH};
use socialcontext_domain::{
    ApiVersion, Credential, HttpMethod, HttpRequest, HttpResponse, Result, SocialContextError,
    Token,
};
use tracing::{debug, instrument, warn};

/// OAuth error body (RFC 6749 §5.2)
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    detail: Option<Value>,
}

impl OAuthErrorBody {
    fn describe(&self) -> Option<String> {
        match (&self.error, &self.error_description, &self.detail) {
            (Some(code), Some(description), _) => Some(format!("{code}: {description}")),
            (Some(code), None, _) => Some(code.clone()),
            (None, Some(description), _) => Some(description.clone()),
            (None, None, Some(Value::String(detail))) => Some(detail.clone()),
            (None, None, Some(detail)) => Some(detail.to_string()),
            (None, None, None) => None,
        }
    }
}

/// Token provider for the client-credentials grant
#[derive(Clone)]
pub struct ClientCredentialsProvider {
    token_url: String,
    refresh_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl ClientCredentialsProvider {
    /// Create a provider for the given API root.
    ///
    /// # Arguments
    /// * `api_root` - Service root, the token paths are appended under `v0.1`
    /// * `transport` - Transport used for the token calls
    pub fn new(api_root: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            token_url: ApiVersion::V0_1.url(api_root, TOKEN_PATH),
            refresh_url: ApiVersion::V0_1.url(api_root, TOKEN_REFRESH_PATH),
            transport,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn request_token(&self, url: &str, form: Vec<(String, String)>) -> Result<Token> {
        let request = HttpRequest::new(HttpMethod::Post, url)
            .header("Accept", "application/json")
            .form(form);

        let response = self.transport.send(request).await.map_err(|err| {
            SocialContextError::AuthenticationFailed(format!("token endpoint unreachable: {err}"))
        })?;

        parse_token_response(&response)
    }
}

impl std::fmt::Debug for ClientCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsProvider")
            .field("token_url", &self.token_url)
            .field("refresh_url", &self.refresh_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    #[instrument(skip(self, credential), fields(client_id = %credential.client_id()))]
    async fn fetch_token(&self, credential: &Credential) -> Result<Token> {
        debug!(url = %self.token_url, "Requesting client-credentials token");

        let form = vec![
            ("grant_type".to_string(), "client_credentials".to_string()),
            ("client_id".to_string(), credential.client_id().to_string()),
            ("client_secret".to_string(), credential.expose_secret().to_string()),
        ];

        self.request_token(&self.token_url, form).await
    }

    #[instrument(skip(self, credential, refresh_token), fields(client_id = %credential.client_id()))]
    async fn refresh_token(&self, credential: &Credential, refresh_token: &str) -> Result<Token> {
        if refresh_token.is_empty() {
            return Err(SocialContextError::AuthenticationFailed(
                "no refresh token available".to_string(),
            ));
        }

        debug!(url = %self.refresh_url, "Refreshing access token");

        let form = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
            ("client_id".to_string(), credential.client_id().to_string()),
            ("client_secret".to_string(), credential.expose_secret().to_string()),
        ];

        self.request_token(&self.refresh_url, form).await
    }
}

fn parse_token_response(response: &HttpResponse) -> Result<Token> {
    if !response.is_success() {
        let detail = serde_json::from_slice::<OAuthErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.describe())
            .unwrap_or_else(|| "please check your client credentials".to_string());
        warn!(status = response.status, "Token endpoint rejected the request");
        return Err(SocialContextError::AuthenticationFailed(format!(
            "token endpoint returned {}: {detail}",
            response.status
        )));
    }

    let raw: Map<String, Value> = serde_json::from_slice(&response.body).map_err(|e| {
        SocialContextError::AuthenticationFailed(format!("token response is not a JSON object: {e}"))
    })?;

    Token::from_response(raw, Utc::now()).ok_or_else(|| {
        SocialContextError::AuthenticationFailed("token response has no access_token".to_string())
    })
}
