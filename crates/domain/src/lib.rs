//! # socialcontext domain
//!
//! Domain types for the socialcontext.ai client.
//!
//! This crate contains:
//! - The error taxonomy and `Result` alias
//! - Credential and token types
//! - Transport-neutral request/response descriptors
//! - Classify and batch job payloads, and the model catalogue
//! - Client configuration and constants
//!
//! ## Architecture
//! - No dependencies on other socialcontext crates
//! - Pure data types; no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::ClientConfig;
pub use errors::{Result, SocialContextError};
pub use types::*;
