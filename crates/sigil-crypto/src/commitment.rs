//! # Poseidon-Style Commitment
//!
//! Binds a payload hash to a private secret. The commitment is embedded in
//! the artifact as `zkPoseidonHash` and becomes `zkPublicInputs[0]` of the
//! proof; the secret never leaves process memory.
//!
//! ## Construction
//!
//! A [`Committer`] owns a 32-byte random key. For a payload hash `h`:
//!
//! ```text
//! secret     = SHA-256(DOMAIN ‖ "secret" ‖ key ‖ h)
//! commitment = SHA-256(DOMAIN ‖ "commit" ‖ h ‖ secret)
//! ```
//!
//! Every variable-length component is length-prefixed, so no two inputs
//! share a transcript. The commitment is therefore deterministic for one
//! committer and one payload hash, which is what the proof freshness check
//! needs, while a committer with a fresh key yields a different, equally
//! valid commitment for the same payload.
//!
//! The hash is SHA-256 standing in for an arithmetic-circuit hash; the
//! protocol only depends on the commitment being a fixed-length hex digest.

use std::path::Path;

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use sigil_core::{ContentDigest, Sha256Accumulator};

use crate::error::CryptoError;

/// Domain separator for every commitment transcript.
pub const COMMITMENT_DOMAIN: &[u8] = b"SM-POSEIDON-COMMIT-v1";

/// 32 bytes of committer key material. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CommitmentKey([u8; 32]);

impl CommitmentKey {
    /// Draw a fresh key from the OS random source.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::Entropy(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex chars.
    pub fn from_hex(hex: &str) -> Result<Self, CryptoError> {
        ContentDigest::from_hex(hex)
            .map(|d| Self(d.bytes))
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Read a hex key from a file, ignoring surrounding whitespace.
    pub fn load(path: &Path) -> Result<Self, CryptoError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_hex(text.trim())
    }

    /// Hex form for persisting a pinned key.
    pub fn to_hex(&self) -> String {
        ContentDigest::sha256(self.0).to_hex()
    }
}

impl std::fmt::Debug for CommitmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommitmentKey([REDACTED])")
    }
}

/// The private opening of a commitment.
///
/// Deliberately not `Serialize`: it must never reach an artifact.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CommitmentSecret([u8; 32]);

impl CommitmentSecret {
    /// Hex form, handed only to the prover.
    pub fn expose_hex(&self) -> String {
        ContentDigest::sha256(self.0).to_hex()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for CommitmentSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommitmentSecret([REDACTED])")
    }
}

impl PartialEq for CommitmentSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for CommitmentSecret {}

/// A commitment in lowercase hex, as embedded in `zkPoseidonHash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(String);

impl Commitment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against an embedded hex string, case-insensitively and in
    /// constant time with respect to content.
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_ascii_lowercase();
        self.0.len() == candidate.len() && bool::from(self.0.as_bytes().ct_eq(candidate.as_bytes()))
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of [`Committer::commit`].
#[derive(Debug, Clone)]
pub struct CommitmentPair {
    pub commitment: Commitment,
    pub secret: CommitmentSecret,
}

/// Derives commitments under one key.
#[derive(Debug, Clone)]
pub struct Committer {
    key: CommitmentKey,
}

impl Committer {
    /// A committer with a freshly drawn key.
    pub fn random() -> Result<Self, CryptoError> {
        Ok(Self {
            key: CommitmentKey::generate()?,
        })
    }

    pub fn with_key(key: CommitmentKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &CommitmentKey {
        &self.key
    }

    /// Commit to a payload hash.
    ///
    /// The hash is taken as given apart from trimming; only an empty value
    /// is rejected.
    pub fn commit(&self, payload_hash: &str) -> Result<CommitmentPair, CryptoError> {
        let payload_hash = normalize_hash(payload_hash)?;
        let secret = self.derive_secret(payload_hash);
        let commitment = commitment_for(payload_hash, &secret);
        Ok(CommitmentPair { commitment, secret })
    }

    /// The commitment alone, for freshness checks.
    pub fn commitment_for(&self, payload_hash: &str) -> Result<Commitment, CryptoError> {
        self.commit(payload_hash).map(|pair| pair.commitment)
    }

    fn derive_secret(&self, payload_hash: &str) -> CommitmentSecret {
        let mut acc = Sha256Accumulator::new();
        absorb(&mut acc, COMMITMENT_DOMAIN);
        absorb(&mut acc, b"secret");
        absorb(&mut acc, &self.key.0);
        absorb(&mut acc, payload_hash.as_bytes());
        CommitmentSecret(acc.finalize().bytes)
    }
}

/// Check that `commitment` opens to `payload_hash` under `secret`.
pub fn verify_opening(payload_hash: &str, commitment: &str, secret: &CommitmentSecret) -> bool {
    match normalize_hash(payload_hash) {
        Ok(h) => commitment_for(h, secret).matches(commitment),
        Err(_) => false,
    }
}

fn commitment_for(payload_hash: &str, secret: &CommitmentSecret) -> Commitment {
    let mut acc = Sha256Accumulator::new();
    absorb(&mut acc, COMMITMENT_DOMAIN);
    absorb(&mut acc, b"commit");
    absorb(&mut acc, payload_hash.as_bytes());
    absorb(&mut acc, &secret.0);
    Commitment(acc.finalize_hex())
}

fn normalize_hash(payload_hash: &str) -> Result<&str, CryptoError> {
    let trimmed = payload_hash.trim();
    if trimmed.is_empty() {
        return Err(CryptoError::InvalidPayloadHash(
            "payload hash is empty".into(),
        ));
    }
    Ok(trimmed)
}

fn absorb(acc: &mut Sha256Accumulator, part: &[u8]) {
    acc.update(&(part.len() as u64).to_be_bytes());
    acc.update(part);
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn pinned() -> Committer {
        Committer::with_key(CommitmentKey::from_bytes([7u8; 32]))
    }

    #[test]
    fn same_key_same_hash_same_commitment() {
        let c = pinned();
        let a = c.commit(HASH).unwrap();
        let b = c.commit(HASH).unwrap();
        assert_eq!(a.commitment, b.commitment);
        assert_eq!(a.secret, b.secret);
        assert_eq!(a.commitment.as_str().len(), 64);
    }

    #[test]
    fn fresh_key_yields_different_commitment() {
        let a = Committer::random().unwrap().commit(HASH).unwrap();
        let b = Committer::random().unwrap().commit(HASH).unwrap();
        assert_ne!(a.commitment, b.commitment);
    }

    #[test]
    fn different_payloads_differ() {
        let c = pinned();
        assert_ne!(
            c.commitment_for(HASH).unwrap(),
            c.commitment_for("other").unwrap()
        );
    }

    #[test]
    fn empty_hash_rejected() {
        assert!(matches!(
            pinned().commit("   "),
            Err(CryptoError::InvalidPayloadHash(_))
        ));
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let c = pinned();
        assert_eq!(
            c.commitment_for(HASH).unwrap(),
            c.commitment_for(&format!("  {HASH}\n")).unwrap()
        );
    }

    #[test]
    fn opening_verifies_only_for_matching_inputs() {
        let pair = pinned().commit(HASH).unwrap();
        assert!(verify_opening(HASH, pair.commitment.as_str(), &pair.secret));
        assert!(verify_opening(
            HASH,
            &pair.commitment.as_str().to_uppercase(),
            &pair.secret
        ));
        assert!(!verify_opening("tampered", pair.commitment.as_str(), &pair.secret));
        let other = Committer::random().unwrap().commit(HASH).unwrap();
        assert!(!verify_opening(HASH, pair.commitment.as_str(), &other.secret));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let pair = pinned().commit(HASH).unwrap();
        let dbg = format!("{:?}", pair.secret);
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains(&pair.secret.expose_hex()));
        assert!(format!("{:?}", pinned()).contains("REDACTED"));
    }

    #[test]
    fn commitment_serializes_as_bare_string() {
        let pair = pinned().commit(HASH).unwrap();
        let json = serde_json::to_value(&pair.commitment).unwrap();
        assert_eq!(json.as_str(), Some(pair.commitment.as_str()));
    }

    #[test]
    fn key_hex_roundtrip_and_file_load() {
        let key = CommitmentKey::generate().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commitment.key");
        std::fs::write(&path, format!("{}\n", key.to_hex())).unwrap();
        let loaded = CommitmentKey::load(&path).unwrap();
        assert_eq!(loaded.to_hex(), key.to_hex());
        assert!(matches!(
            CommitmentKey::from_hex("not-hex"),
            Err(CryptoError::InvalidKey(_))
        ));
    }
}
