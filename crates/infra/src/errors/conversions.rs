//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use socialcontext_common::CryptoError;
use socialcontext_core::TransportError;
use socialcontext_domain::SocialContextError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SocialContextError);

impl From<InfraError> for SocialContextError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SocialContextError> for InfraError {
    fn from(value: SocialContextError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SocialContextError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let mapped = match value {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => {
                        SocialContextError::Storage("token store is busy".into())
                    }
                    ErrorCode::DatabaseLocked => {
                        SocialContextError::Storage("token store is locked".into())
                    }
                    ErrorCode::NotADatabase | ErrorCode::DatabaseCorrupt => {
                        SocialContextError::StoreCorrupted(format!(
                            "token store file is damaged or not a database: {message}"
                        ))
                    }
                    _ => SocialContextError::Storage(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::FromSqlConversionFailure(_, _, cause) => SocialContextError::StoreCorrupted(
                format!("failed to convert stored value: {cause}"),
            ),
            RE::InvalidColumnType(_, _, ty) => {
                SocialContextError::StoreCorrupted(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => SocialContextError::Storage(format!(
                "invalid token store path: {}",
                path.to_string_lossy()
            )),
            other => SocialContextError::Storage(other.to_string()),
        };

        InfraError(mapped)
    }
}

/* -------------------------------------------------------------------------- */
/* CryptoError → SocialContextError */
/* -------------------------------------------------------------------------- */

impl From<CryptoError> for InfraError {
    fn from(value: CryptoError) -> Self {
        match value {
            CryptoError::InvalidKey(msg) => InfraError(SocialContextError::Config(msg)),
            other => InfraError(SocialContextError::StoreCorrupted(other.to_string())),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

/// Classify a reqwest failure for the transport port.
pub fn transport_error(err: &HttpError) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout("HTTP request timed out".into());
    }

    #[cfg(not(target_arch = "wasm32"))]
    if err.is_connect() {
        return TransportError::Network(format!("HTTP connection failure: {err}"));
    }

    TransportError::Network(format!("HTTP request failed: {err}"))
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(transport_error(&value).into())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
