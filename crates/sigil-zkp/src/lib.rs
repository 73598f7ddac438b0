//! # sigil-zkp — Proof Layer
//!
//! Defines the [`ProofSystem`] abstraction the sigil protocol proves
//! commitment openings through, the [`ProofGenerator`] that enforces the
//! proof record contract, and the `proofHints` metadata that accompanies
//! every embedded proof.
//!
//! ## Backends
//!
//! - `MockProofSystem` (feature `mock`, on by default): transparent
//!   SHA-256 proofs with random nonces. Not private.
//! - Hosts implement [`ProofSystem`] for a real prover and hand it to
//!   [`ProofGenerator::new`].
//!
//! ## Crate Policy
//!
//! - A missing prover is `ProofError::Unavailable`, never a placeholder
//!   proof.
//! - Commitment secrets are passed by reference and never serialized.

pub mod generator;
pub mod hints;
#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;

pub use generator::{ProofGenerator, ProofRecord};
pub use hints::{HintDefaults, ProofHints, DEFAULT_EXPLORER_BASE, DEFAULT_PROOF_API};
#[cfg(feature = "mock")]
pub use mock::{MockProof, MockProofSystem};
pub use traits::{ProofError, ProofSystem, ProverOutput, VerifyError};
