//! # Error Hierarchy
//!
//! Structured error types for the sigil protocol, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! [`SigilError`] is the taxonomy every core operation reports through.
//! Variants whose message is shown to users as-is (`MissingMetadata`,
//! `InvalidArtifact`) display their payload verbatim; the rest carry a short
//! prefix naming the failing layer.

use thiserror::Error;

/// Top-level error type for the sigil protocol.
#[derive(Error, Debug)]
pub enum SigilError {
    /// Value outside the canonicalization grammar. Caller bug, not retryable.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// The artifact carries no classifiable payload where one was required.
    #[error("{0}")]
    MissingMetadata(String),

    /// The prover failed or was never configured.
    #[error("proof unavailable: {0}")]
    ProofUnavailable(String),

    /// Input is not an SVG document (bad XML, wrong root element).
    #[error("{0}")]
    InvalidArtifact(String),

    /// Payload JSON does not fit the expected schema.
    #[error("payload error: {0}")]
    Payload(String),

    /// Recomputed hashes disagree with declared ones.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// SVG could not be rendered to PNG.
    #[error("rasterization failed: {0}")]
    Rasterization(String),

    /// Export bundle could not be assembled.
    #[error("packaging failed: {0}")]
    Packaging(String),

    /// Best-effort cache layer failure. Callers swallow these.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded or is out of range.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SigilError {
    /// Message used when sealing finds no payload to prove.
    pub const MISSING_METADATA_FOR_PROOF: &'static str =
        "Sigil metadata missing; cannot generate ZK proof";

    /// Message used when a scanned file is not an SVG document.
    pub const NOT_AN_SVG: &'static str = "Not a valid SVG file";

    pub fn missing_metadata_for_proof() -> Self {
        Self::MissingMetadata(Self::MISSING_METADATA_FOR_PROOF.to_string())
    }

    pub fn not_an_svg() -> Self {
        Self::InvalidArtifact(Self::NOT_AN_SVG.to_string())
    }

    /// Whether a user retry of the same operation can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProofUnavailable(_) | Self::Rasterization(_) | Self::Io(_) | Self::Storage(_)
        )
    }
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum EncodingError {
    /// Value nests deeper than the canonicalizer accepts.
    #[error("value exceeds maximum nesting depth of {limit}")]
    DepthExceeded { limit: usize },

    /// Value cannot be represented in the canonical JSON grammar.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
