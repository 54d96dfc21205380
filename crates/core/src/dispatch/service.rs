//! Authenticated dispatcher - token lifecycle and single retry
//!
//! State machine:
//!
//! ```text
//! Unauthenticated --connect--> Authenticated --policy status / bad token--> Reauthenticating
//!        ^                                                                     |
//!        +---------------- fetch failed ---------------------------------------+
//!                                    Authenticated <--- new token, retry once -+
//! ```
//!
//! Every dispatch makes at most two attempts and at most one
//! reauthentication. The live [`AuthenticatedTransport`] sits behind an
//! `RwLock<Option<Arc<_>>>` and is replaced wholesale, never mutated.

use std::sync::{Arc, PoisonError, RwLock};

use socialcontext_domain::{
    Credential, HttpRequest, HttpResponse, RequestDescriptor, Result, SocialContextError, Token,
};
use tracing::{debug, error, info, instrument, warn};

use super::policy::{AttemptOutcome, DispatchState, ReauthPolicy, ReauthTrigger};
use super::transport::AuthenticatedTransport;
use crate::auth::{TokenProvider, TokenStore};
use crate::transport::{HttpTransport, TransportError};

/// Issues authenticated requests and re-authenticates transparently
pub struct AuthenticatedDispatcher {
    api_root: String,
    credential: Credential,
    transport: Arc<dyn HttpTransport>,
    provider: Arc<dyn TokenProvider>,
    store: Arc<dyn TokenStore>,
    policy: ReauthPolicy,
    session: RwLock<Session>,
}

struct Session {
    state: DispatchState,
    transport: Option<Arc<AuthenticatedTransport>>,
}

impl AuthenticatedDispatcher {
    /// Create a dispatcher in the `Unauthenticated` state.
    ///
    /// # Arguments
    /// * `api_root` - Service root, e.g. `https://beta.socialcontext.ai`
    /// * `credential` - Application credential for the client-credentials grant
    /// * `transport` - Raw HTTP transport; bearer auth is layered on top
    /// * `provider` - Token endpoint client
    /// * `store` - Encrypted token cache
    pub fn new(
        api_root: impl Into<String>,
        credential: Credential,
        transport: Arc<dyn HttpTransport>,
        provider: Arc<dyn TokenProvider>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            api_root: api_root.into().trim_end_matches('/').to_string(),
            credential,
            transport,
            provider,
            store,
            policy: ReauthPolicy::default(),
            session: RwLock::new(Session {
                state: DispatchState::Unauthenticated,
                transport: None,
            }),
        }
    }

    /// Replace the default reauthentication policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ReauthPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    pub fn client_id(&self) -> &str {
        self.credential.client_id()
    }

    pub fn policy(&self) -> &ReauthPolicy {
        &self.policy
    }

    pub fn state(&self) -> DispatchState {
        self.read_session(|s| s.state)
    }

    /// Load the cached token or obtain a new one, then build the transport.
    ///
    /// An expired cached token is refreshed when it carries a refresh token;
    /// a failed refresh falls back to a full client-credentials fetch.
    ///
    /// # Errors
    /// - `StoreCorrupted` if the cached record cannot be read. It is never
    ///   treated as an empty cache.
    /// - `AuthenticationFailed` if no token could be obtained.
    #[instrument(skip(self), fields(client_id = %self.client_id()))]
    pub async fn connect(&self) -> Result<()> {
        self.establish().await.map(|_| ())
    }

    /// Send a request, re-authenticating and retrying once if needed.
    ///
    /// The first attempt's reauth-triggering response is never returned;
    /// the retried attempt's result is returned as-is, whatever its status.
    ///
    /// # Errors
    /// - `RequestFailed` when no response was received
    /// - `AuthenticationFailed` when reauthentication could not obtain a token
    /// - `StoreCorrupted` or `Storage` from the token store
    #[instrument(
        skip(self, descriptor),
        fields(client_id = %self.client_id(), method = %descriptor.method, path = %descriptor.path)
    )]
    pub async fn dispatch(&self, descriptor: RequestDescriptor) -> Result<HttpResponse> {
        let request = descriptor.into_request(&self.api_root);
        self.dispatch_request(request).await
    }

    /// Dispatch an already-resolved request.
    pub async fn dispatch_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let transport = self.establish().await?;

        let trigger = match self.attempt(&transport, request.clone()).await {
            AttemptOutcome::Completed(response) => return Ok(response),
            AttemptOutcome::Failed(err) => return Err(err),
            AttemptOutcome::NeedsReauth(trigger) => trigger,
        };

        warn!(
            client_id = %self.client_id(),
            reason = %trigger.reason(),
            "Token rejected, re-authenticating"
        );

        let transport = self.reauthenticate().await?;

        match self.attempt(&transport, request).await {
            AttemptOutcome::Completed(response) => Ok(response),
            AttemptOutcome::NeedsReauth(ReauthTrigger::Status(response)) => {
                warn!(
                    client_id = %self.client_id(),
                    status = response.status,
                    "Request still rejected after re-authentication"
                );
                Ok(response)
            }
            AttemptOutcome::NeedsReauth(ReauthTrigger::InvalidToken(msg)) => {
                Err(SocialContextError::AuthenticationFailed(msg))
            }
            AttemptOutcome::Failed(err) => Err(err),
        }
    }

    /// Drop the cached token and return to `Unauthenticated`.
    #[instrument(skip(self), fields(client_id = %self.client_id()))]
    pub async fn invalidate(&self) -> Result<()> {
        self.store.clear(self.client_id()).await?;
        self.write_session(|s| {
            s.state = DispatchState::Unauthenticated;
            s.transport = None;
        });
        info!(client_id = %self.client_id(), "Cached token cleared");
        Ok(())
    }

    async fn attempt(
        &self,
        transport: &AuthenticatedTransport,
        request: HttpRequest,
    ) -> AttemptOutcome {
        match transport.send(request).await {
            Ok(response) if self.policy.triggers(response.status) => {
                AttemptOutcome::NeedsReauth(ReauthTrigger::Status(response))
            }
            Ok(response) => {
                debug!(status = response.status, "Request completed");
                AttemptOutcome::Completed(response)
            }
            Err(TransportError::MissingToken(msg)) => {
                AttemptOutcome::NeedsReauth(ReauthTrigger::InvalidToken(msg))
            }
            Err(err) => AttemptOutcome::Failed(err.into()),
        }
    }

    async fn establish(&self) -> Result<Arc<AuthenticatedTransport>> {
        if let Some(transport) = self.read_session(|s| s.transport.clone()) {
            return Ok(transport);
        }

        let token = match self.store.load(self.client_id()).await {
            Ok(Some(token)) if token.is_expired() => self.renew(&token).await?,
            Ok(Some(token)) => {
                debug!(client_id = %self.client_id(), "Using cached token");
                token
            }
            Ok(None) => self.acquire().await?,
            Err(err) => {
                error!(client_id = %self.client_id(), error = %err, "Token store unreadable");
                return Err(err);
            }
        };

        Ok(self.install(token))
    }

    async fn renew(&self, expired: &Token) -> Result<Token> {
        let Some(refresh_token) = expired.refresh_token.as_deref() else {
            debug!(client_id = %self.client_id(), "Cached token expired, fetching a new one");
            return self.acquire().await;
        };

        match self.provider.refresh_token(&self.credential, refresh_token).await {
            Ok(token) => {
                info!(client_id = %self.client_id(), "Access token refreshed");
                self.store.save(self.client_id(), &token).await?;
                Ok(token)
            }
            Err(err) => {
                warn!(
                    client_id = %self.client_id(),
                    error = %err,
                    "Token refresh failed, falling back to client credentials"
                );
                self.acquire().await
            }
        }
    }

    async fn acquire(&self) -> Result<Token> {
        let token = self.provider.fetch_token(&self.credential).await?;
        info!(client_id = %self.client_id(), "Access token acquired");
        self.store.save(self.client_id(), &token).await?;
        Ok(token)
    }

    async fn reauthenticate(&self) -> Result<Arc<AuthenticatedTransport>> {
        self.write_session(|s| s.state = DispatchState::Reauthenticating);

        match self.replace_token().await {
            Ok(token) => Ok(self.install(token)),
            Err(err) => {
                self.write_session(|s| {
                    s.state = DispatchState::Unauthenticated;
                    s.transport = None;
                });
                error!(client_id = %self.client_id(), error = %err, "Re-authentication failed");
                Err(match err {
                    local @ (SocialContextError::AuthenticationFailed(_)
                    | SocialContextError::StoreCorrupted(_)
                    | SocialContextError::Storage(_)) => local,
                    other => SocialContextError::AuthenticationFailed(other.to_string()),
                })
            }
        }
    }

    async fn replace_token(&self) -> Result<Token> {
        self.store.clear(self.client_id()).await?;
        self.acquire().await
    }

    fn install(&self, token: Token) -> Arc<AuthenticatedTransport> {
        let transport = Arc::new(AuthenticatedTransport::new(Arc::clone(&self.transport), token));
        self.write_session(|s| {
            s.state = DispatchState::Authenticated;
            s.transport = Some(Arc::clone(&transport));
        });
        debug!(client_id = %self.client_id(), "Authenticated transport installed");
        transport
    }

    fn read_session<T>(&self, f: impl FnOnce(&Session) -> T) -> T {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    fn write_session(&self, f: impl FnOnce(&mut Session)) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut session);
    }
}

impl std::fmt::Debug for AuthenticatedDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedDispatcher")
            .field("api_root", &self.api_root)
            .field("client_id", &self.client_id())
            .field("state", &self.state())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
