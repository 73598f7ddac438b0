//! # sigil-crypto — Commitment Primitives
//!
//! Provides the Poseidon-style commitment that anchors every sigil proof:
//! a keyed, domain-separated hash of the payload hash whose private opening
//! is zeroized on drop and never serialized.
//!
//! ## Crate Policy
//!
//! - Depends only on `sigil-core` internally.
//! - All hashing goes through `sigil_core::Sha256Accumulator`.
//! - Secret material has redacted `Debug` output and constant-time equality.

pub mod commitment;
pub mod error;

pub use commitment::{
    verify_opening, Commitment, CommitmentKey, CommitmentPair, CommitmentSecret, Committer,
    COMMITMENT_DOMAIN,
};
pub use error::CryptoError;
