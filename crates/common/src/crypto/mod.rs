//! Shared cryptographic primitives.

pub mod encryption;

pub use encryption::{CryptoError, CryptoResult, EncryptedData, EncryptionService};
