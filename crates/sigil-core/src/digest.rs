//! # Content Digest — the Single Hash of the Protocol
//!
//! Every "hash" the sigil protocol mentions (payload hash, SVG hash, PNG hash,
//! manifest hash) is a SHA-256 digest rendered as 64 lowercase hex chars.
//! Cross-component comparisons rely on there being exactly one algorithm and
//! one digest length, so nothing else in the workspace calls `sha2` for
//! content hashing.
//!
//! ## Two Entry Points
//!
//! - [`sha256_digest()`] accepts only [`CanonicalBytes`] and is used for
//!   structured values (payloads, manifests).
//! - [`Sha256Accumulator`] hashes raw artifact bytes (SVG text, PNG files),
//!   which are already byte-exact and must not be re-canonicalized.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::SigilError;

/// The hash algorithm that produced a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    pub fn sha256(bytes: [u8; 32]) -> Self {
        Self {
            algorithm: DigestAlgorithm::Sha256,
            bytes,
        }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a 64-char hex string (either case) into a SHA-256 digest.
    pub fn from_hex(hex: &str) -> Result<Self, SigilError> {
        let hex = hex.trim();
        if hex.len() != 64 {
            return Err(SigilError::Integrity(format!(
                "digest must be 64 hex chars, got {} chars",
                hex.len()
            )));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SigilError::Integrity(
                "digest contains non-hex characters".into(),
            ));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            bytes[i] = (hex_nibble(chunk[0]) << 4) | hex_nibble(chunk[1]);
        }
        Ok(Self::sha256(bytes))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        _ => c - b'A' + 10,
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut acc = Sha256Accumulator::new();
    acc.update(data.as_bytes());
    acc.finalize()
}

/// Hex form of [`sha256_digest()`].
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

/// Incremental SHA-256 over raw bytes.
///
/// Reserved for inputs that are already byte-exact artifacts (SVG text as
/// written, PNG output, composite prover transcripts). Structured values go
/// through [`sha256_digest()`].
#[derive(Clone, Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl std::fmt::Debug for Sha256Accumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256Accumulator").finish_non_exhaustive()
    }
}

impl Sha256Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    pub fn finalize(self) -> ContentDigest {
        let hash = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        ContentDigest::sha256(bytes)
    }

    pub fn finalize_hex(self) -> String {
        self.finalize().to_hex()
    }
}

/// Hash raw artifact bytes. The empty input is valid.
pub fn artifact_hash(data: &[u8]) -> ContentDigest {
    let mut acc = Sha256Accumulator::new();
    acc.update(data);
    acc.finalize()
}
