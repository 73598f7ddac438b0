//! # Cryptographic Error Types
//!
//! Structured errors for the commitment layer.

use thiserror::Error;

use sigil_core::SigilError;

/// Errors from commitment operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The payload hash handed to `commit` is empty.
    #[error("invalid payload hash: {0}")]
    InvalidPayloadHash(String),

    /// Commitment key material is malformed.
    #[error("invalid commitment key: {0}")]
    InvalidKey(String),

    /// The OS random source failed.
    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    /// I/O error reading a key file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CryptoError> for SigilError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Io(e) => SigilError::Io(e),
            CryptoError::InvalidPayloadHash(_) => SigilError::Payload(err.to_string()),
            other => SigilError::ProofUnavailable(other.to_string()),
        }
    }
}
