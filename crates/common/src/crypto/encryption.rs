//! AES-256-GCM encryption keyed by an application secret.
//!
//! - [`EncryptionService`]: encrypt/decrypt with a 32-byte key
//! - [`EncryptedData`]: serializable container for nonce and ciphertext
//!
//! Keys are derived deterministically from a secret with
//! [`EncryptionService::from_secret`], so the same secret always opens what
//! it sealed, across processes and restarts. A different secret fails the
//! GCM tag check instead of yielding garbage plaintext.
//!
//! ## Usage
//!
//! ```rust
//! use socialcontext_common::crypto::encryption::EncryptionService;
//!
//! let service = EncryptionService::from_secret("my-app-secret")?;
//!
//! let sealed = service.encrypt_to_string(b"token payload")?;
//! let opened = service.decrypt_from_string(&sealed)?;
//! assert_eq!(opened, b"token payload");
//! # Ok::<(), socialcontext_common::crypto::CryptoError>(())
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD as BASE64};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

const ALGORITHM: &str = "AES-256-GCM";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// URL-safe alphabet that tolerates missing or present padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised by [`EncryptionService`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Authentication tag mismatch, bad nonce or unknown algorithm
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Stored payload is not valid base64 or JSON
    #[error("malformed payload: {0}")]
    Malformed(String),
}

pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Encrypted data container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub algorithm: String,
}

/// AES-GCM encryption service
pub struct EncryptionService {
    key: Zeroizing<Vec<u8>>,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("key", &"[REDACTED]")
            .field("fingerprint", &self.key_fingerprint())
            .finish()
    }
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidKey`] for any other key length.
    pub fn new(key: Vec<u8>) -> CryptoResult<Self> {
        let key = Zeroizing::new(key);
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "key must be exactly {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::InvalidKey(format!("failed to create cipher: {e}")))?;

        Ok(Self { key, cipher })
    }

    /// Derive the service key from an application secret.
    ///
    /// The secret is first normalized as URL-safe base64 (padding optional);
    /// secrets that are not base64 are used as raw bytes. The normalized
    /// bytes are hashed with SHA-256 to obtain the 32-byte key.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidKey`] for an empty secret.
    pub fn from_secret(secret: &str) -> CryptoResult<Self> {
        if secret.is_empty() {
            return Err(CryptoError::InvalidKey("secret must not be empty".to_string()));
        }

        Self::new(derive_key(secret))
    }

    /// Encrypt bytes into an [`EncryptedData`] payload with a fresh nonce.
    pub fn encrypt(&self, data: &[u8]) -> CryptoResult<EncryptedData> {
        let nonce_bytes = Self::generate_nonce();
        let ciphertext = self
            .cipher
            .encrypt(&Nonce::from(nonce_bytes), data)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        Ok(EncryptedData {
            nonce: nonce_bytes.to_vec(),
            ciphertext,
            algorithm: ALGORITHM.to_string(),
        })
    }

    /// Decrypt an [`EncryptedData`] payload back into raw bytes.
    pub fn decrypt(&self, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
        if encrypted.algorithm != ALGORITHM {
            return Err(CryptoError::Decryption(format!(
                "unsupported algorithm: {}",
                encrypted.algorithm
            )));
        }

        let nonce: [u8; NONCE_LEN] = encrypted.nonce.as_slice().try_into().map_err(|_| {
            CryptoError::Decryption(format!("nonce must be exactly {NONCE_LEN} bytes"))
        })?;

        self.cipher
            .decrypt(&Nonce::from(nonce), encrypted.ciphertext.as_ref())
            .map_err(|_| CryptoError::Decryption("authentication tag mismatch".to_string()))
    }

    /// Encrypt bytes and encode the payload as a base64 string.
    pub fn encrypt_to_string(&self, data: &[u8]) -> CryptoResult<String> {
        let encrypted = self.encrypt(data)?;
        let serialized = serde_json::to_vec(&encrypted)
            .map_err(|e| CryptoError::Encryption(format!("failed to serialize payload: {e}")))?;
        Ok(BASE64.encode(serialized))
    }

    /// Decode a base64 string and decrypt the contained payload.
    pub fn decrypt_from_string(&self, encrypted_str: &str) -> CryptoResult<Vec<u8>> {
        let decoded = BASE64
            .decode(encrypted_str.trim())
            .map_err(|e| CryptoError::Malformed(format!("base64 decode failed: {e}")))?;
        let encrypted: EncryptedData = serde_json::from_slice(&decoded)
            .map_err(|e| CryptoError::Malformed(format!("invalid payload: {e}")))?;
        self.decrypt(&encrypted)
    }

    /// Short fingerprint of the current key, safe to log.
    pub fn key_fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key.as_slice());
        BASE64.encode(&digest[..8])
    }

    fn generate_nonce() -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }
}

fn derive_key(secret: &str) -> Vec<u8> {
    let material = Zeroizing::new(
        URL_SAFE_LENIENT.decode(secret.trim()).unwrap_or_else(|_| secret.as_bytes().to_vec()),
    );
    Sha256::digest(material.as_slice()).to_vec()
}
