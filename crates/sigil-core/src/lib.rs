//! # sigil-core — Foundational Types for the Sigil Artifact Protocol
//!
//! Every hash the protocol compares is produced here. The crate defines the
//! canonicalizer, the single content digest, the error taxonomy, the tagged
//! [`Outcome`] handed to hosts, and the pulse calendar seam used by export
//! manifests. It depends on no other `sigil-*` crate.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All structured-value digests flow through
//!    `CanonicalBytes::new()`. No raw `serde_json::to_vec()` for hashing.
//!
//! 2. **One algorithm.** `sha256_digest()` accepts only `&CanonicalBytes`;
//!    raw artifact bytes (SVG text, PNG output) go through
//!    [`artifact_hash()`]. Both produce the same 64-hex-char SHA-256 form.
//!
//! 3. **No throwing across the host boundary.** Orchestrating operations
//!    return [`Outcome`], never a panic, for expected failures.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod outcome;
pub mod pulse;
pub mod temporal;

pub use canonical::{canonicalize, CanonicalBytes, MAX_CANONICAL_DEPTH};
pub use digest::{
    artifact_hash, sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm, Sha256Accumulator,
};
pub use error::{EncodingError, SigilError};
pub use outcome::Outcome;
pub use pulse::{KaiCalendar, PulseCalendar, PulseMoment};
pub use temporal::Timestamp;
