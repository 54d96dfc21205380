//! Shared utilities for the socialcontext crates.
//!
//! Currently this is the symmetric encryption used to protect cached access
//! tokens at rest.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod crypto;

// Re-export commonly used types for convenience
pub use crypto::{CryptoError, CryptoResult, EncryptedData, EncryptionService};
