//! In-memory port implementations for tests
//!
//! - [`MemoryTokenStore`]: token store backed by a `HashMap`
//! - [`ScriptedTransport`]: replays queued responses and records requests
//! - [`CountingTokenProvider`]: hands out numbered tokens and counts calls

#![allow(clippy::missing_errors_doc)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use socialcontext_domain::{
    Credential, HttpRequest, HttpResponse, Result, SocialContextError, Token,
};

use crate::auth::{TokenProvider, TokenStore};
use crate::transport::{HttpTransport, TransportError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a token the way the token endpoint would return it.
pub fn token(access_token: &str) -> Token {
    token_from(json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
    }))
}

/// Build a token that expired an hour ago, optionally refreshable.
pub fn expired_token(access_token: &str, refresh_token: Option<&str>) -> Token {
    let mut token = token(access_token);
    token.expires_at = Some(Utc::now() - Duration::hours(1));
    token.refresh_token = refresh_token.map(str::to_string);
    token
}

fn token_from(value: Value) -> Token {
    let raw = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Token::from_response(raw.clone(), Utc::now()).unwrap_or(Token {
        access_token: String::new(),
        token_type: "bearer".to_string(),
        expires_at: None,
        refresh_token: None,
        raw,
    })
}

pub fn credential() -> Credential {
    Credential::new("test-app", "test-secret").unwrap_or_else(|_| unreachable!())
}

// ============================================================================
// Token store
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: Mutex<HashMap<String, Token>>,
    corrupted: Mutex<HashSet<String>>,
    saves: AtomicUsize,
    clears: AtomicUsize,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a token.
    pub fn with_token(self, client_id: &str, token: Token) -> Self {
        lock(&self.records).insert(client_id.to_string(), token);
        self
    }

    /// Make `load` report the record as undecryptable.
    pub fn corrupt(&self, client_id: &str) {
        lock(&self.corrupted).insert(client_id.to_string());
    }

    pub fn get(&self, client_id: &str) -> Option<Token> {
        lock(&self.records).get(client_id).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, client_id: &str, token: &Token) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        lock(&self.corrupted).remove(client_id);
        lock(&self.records).insert(client_id.to_string(), token.clone());
        Ok(())
    }

    async fn load(&self, client_id: &str) -> Result<Option<Token>> {
        if lock(&self.corrupted).contains(client_id) {
            return Err(SocialContextError::StoreCorrupted(format!(
                "record for {client_id} cannot be decrypted"
            )));
        }
        Ok(lock(&self.records).get(client_id).cloned())
    }

    async fn clear(&self, client_id: &str) -> Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        lock(&self.corrupted).remove(client_id);
        lock(&self.records).remove(client_id);
        Ok(())
    }
}

// ============================================================================
// Transport
// ============================================================================

type Scripted = std::result::Result<HttpResponse, TransportError>;

/// Transport that replays queued results in order.
///
/// Once the queue is empty every request gets `200 {}`.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: Value) -> &Self {
        lock(&self.script).push_back(Ok(HttpResponse::with_json(status, &body)));
        self
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Every request received so far, headers included.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// `Authorization` header values, in request order.
    pub fn bearer_tokens(&self) -> Vec<String> {
        lock(&self.requests)
            .iter()
            .filter_map(|r| r.header_value("Authorization").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request);
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::with_json(200, &json!({}))))
    }
}

// ============================================================================
// Token provider
// ============================================================================

/// Provider that issues `token-1`, `token-2`, ... and counts calls.
#[derive(Debug, Default)]
pub struct CountingTokenProvider {
    fetches: AtomicUsize,
    refreshes: AtomicUsize,
    issued: AtomicUsize,
    fail_fetch: bool,
    fail_refresh: bool,
    refreshable: bool,
}

impl CountingTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose every fetch fails with `AuthenticationFailed`.
    pub fn failing() -> Self {
        Self { fail_fetch: true, ..Self::default() }
    }

    /// Issue tokens carrying refresh tokens.
    pub fn refreshable(mut self) -> Self {
        self.refreshable = true;
        self
    }

    /// Reject refresh attempts.
    pub fn rejecting_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn issue(&self) -> Token {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let mut issued = token(&format!("token-{n}"));
        if self.refreshable {
            issued.refresh_token = Some(format!("refresh-{n}"));
        }
        issued
    }
}

#[async_trait]
impl TokenProvider for CountingTokenProvider {
    async fn fetch_token(&self, _credential: &Credential) -> Result<Token> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(SocialContextError::AuthenticationFailed(
                "credentials rejected".to_string(),
            ));
        }
        Ok(self.issue())
    }

    async fn refresh_token(&self, _credential: &Credential, _refresh_token: &str) -> Result<Token> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            return Err(SocialContextError::AuthenticationFailed("refresh rejected".to_string()));
        }
        Ok(self.issue())
    }
}

/// Shared handles to the three doubles, wired for a dispatcher.
#[derive(Debug, Clone)]
pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub provider: Arc<CountingTokenProvider>,
    pub store: Arc<MemoryTokenStore>,
}

impl Harness {
    pub fn new(provider: CountingTokenProvider, store: MemoryTokenStore) -> Self {
        Self {
            transport: Arc::new(ScriptedTransport::new()),
            provider: Arc::new(provider),
            store: Arc::new(store),
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(CountingTokenProvider::new(), MemoryTokenStore::new())
    }
}
