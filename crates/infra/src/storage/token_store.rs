//! Encrypted SQLite token store.
//!
//! Each token is serialized to JSON, encrypted with AES-256-GCM under a key
//! derived from the application secret and stored as one row per client id.
//! All database operations run in `spawn_blocking` so the async runtime is
//! never blocked on file I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use socialcontext_common::EncryptionService;
use socialcontext_core::TokenStore;
use socialcontext_domain::{Credential, Result, SocialContextError, Token};
use tokio::task;
use tracing::{debug, info, instrument};

use crate::errors::InfraError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS stored_tokens (
    client_id TEXT PRIMARY KEY NOT NULL,
    payload TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)";

/// SQLite-backed [`TokenStore`] whose payloads are encrypted at rest.
///
/// A connection is opened per operation, so several processes can share the
/// same file. Concurrent writers are serialized by SQLite's busy timeout.
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    path: PathBuf,
    cipher: Arc<EncryptionService>,
}

impl SqliteTokenStore {
    /// Create a store at `path` using an explicit encryption service.
    pub fn new(path: impl Into<PathBuf>, cipher: EncryptionService) -> Self {
        Self { path: path.into(), cipher: Arc::new(cipher) }
    }

    /// Create a store whose key is derived from the credential's secret.
    pub fn for_credential(path: impl Into<PathBuf>, credential: &Credential) -> Result<Self> {
        let cipher = EncryptionService::from_secret(credential.expose_secret())
            .map_err(|e| SocialContextError::from(InfraError::from(e)))?;
        let store = Self::new(path, cipher);
        debug!(
            path = %store.path.display(),
            key = %store.cipher.key_fingerprint(),
            "token store configured"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &EncryptionService) -> Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        let cipher = Arc::clone(&self.cipher);

        task::spawn_blocking(move || -> Result<T> {
            let conn = open_connection(&path)?;
            op(&conn, &cipher)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    #[instrument(skip(self, token), fields(path = %self.path.display()))]
    async fn save(&self, client_id: &str, token: &Token) -> Result<()> {
        let client_id = client_id.to_string();
        let plaintext = serde_json::to_vec(token)
            .map_err(|e| SocialContextError::Storage(format!("failed to serialize token: {e}")))?;

        self.run(move |conn, cipher| {
            let payload = cipher
                .encrypt_to_string(&plaintext)
                .map_err(|e| SocialContextError::from(InfraError::from(e)))?;
            upsert_token(conn, &client_id, &payload)?;
            info!(client_id = %client_id, "token persisted");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self, client_id: &str) -> Result<Option<Token>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let client_id = client_id.to_string();
        self.run(move |conn, cipher| {
            let Some(payload) = select_payload(conn, &client_id)? else {
                debug!(client_id = %client_id, "no stored token");
                return Ok(None);
            };

            let plaintext = cipher
                .decrypt_from_string(&payload)
                .map_err(|e| SocialContextError::from(InfraError::from(e)))?;
            let token = serde_json::from_slice::<Token>(&plaintext).map_err(|e| {
                SocialContextError::StoreCorrupted(format!("stored token is not valid: {e}"))
            })?;

            Ok(Some(token))
        })
        .await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn clear(&self, client_id: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        let client_id = client_id.to_string();
        self.run(move |conn, _| {
            let removed = conn
                .execute("DELETE FROM stored_tokens WHERE client_id = ?1", params![client_id])
                .map_err(sql_error)?;
            info!(client_id = %client_id, removed, "stored token cleared");
            Ok(())
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn open_connection(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            SocialContextError::Storage(format!(
                "failed to create token store directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let conn = Connection::open(path).map_err(sql_error)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(sql_error)?;
    conn.execute_batch(SCHEMA_SQL).map_err(sql_error)?;
    Ok(conn)
}

fn upsert_token(conn: &Connection, client_id: &str, payload: &str) -> Result<()> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        "INSERT INTO stored_tokens (client_id, payload, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(client_id) DO UPDATE SET
            payload = excluded.payload,
            updated_at = excluded.updated_at",
        params![client_id, payload, now],
    )
    .map_err(sql_error)?;
    Ok(())
}

fn select_payload(conn: &Connection, client_id: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT payload FROM stored_tokens WHERE client_id = ?1",
        params![client_id],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(sql_error)
}

fn sql_error(err: rusqlite::Error) -> SocialContextError {
    InfraError::from(err).into()
}

fn map_join_error(err: task::JoinError) -> SocialContextError {
    if err.is_cancelled() {
        SocialContextError::Storage("token store task cancelled".into())
    } else {
        SocialContextError::Storage(format!("token store task failed: {err}"))
    }
}
