//! Bearer-authenticated transport
//!
//! An [`AuthenticatedTransport`] pairs the shared HTTP transport with one
//! token. It is immutable: a new instance replaces it on every
//! reauthentication.

use std::sync::Arc;

use socialcontext_domain::{HttpRequest, HttpResponse, Token};

use crate::transport::{HttpTransport, TransportError};

pub struct AuthenticatedTransport {
    inner: Arc<dyn HttpTransport>,
    token: Token,
}

impl AuthenticatedTransport {
    pub fn new(inner: Arc<dyn HttpTransport>, token: Token) -> Self {
        Self { inner, token }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Attach the bearer header and send.
    ///
    /// # Errors
    /// [`TransportError::MissingToken`] without touching the network when the
    /// token is blank; otherwise whatever the inner transport reports.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if self.token.access_token.trim().is_empty() {
            return Err(TransportError::MissingToken("access token is empty".to_string()));
        }

        let request = request.header("Authorization", self.token.authorization_header());
        self.inner.send(request).await
    }
}

impl std::fmt::Debug for AuthenticatedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedTransport").field("token", &self.token).finish_non_exhaustive()
    }
}
