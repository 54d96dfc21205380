//! # socialcontext infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP transport (reqwest)
//! - Client-credentials token provider
//! - Encrypted SQLite token store
//! - Configuration and job profile loading
//! - Client bootstrap
//!
//! ## Architecture
//! - Implements traits defined in `socialcontext-core`
//! - Contains all "impure" code (network, file system)

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod http;
pub mod storage;

pub use auth::ClientCredentialsProvider;
pub use bootstrap::{build_client, connect_client};
pub use errors::InfraError;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
pub use storage::SqliteTokenStore;
