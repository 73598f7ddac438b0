//! # Proof System Trait
//!
//! Defines the asynchronous interface every prover backend satisfies. Proof
//! generation may suspend on an external prover; callers cancel only by
//! dropping the future.
//!
//! Unlike a closed set of built-in backends, hosts plug in their own
//! prover, so the trait is open for implementation outside this crate.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use sigil_core::SigilError;
use sigil_crypto::{Commitment, CommitmentSecret};

/// Error during proof generation.
#[derive(Error, Debug)]
pub enum ProofError {
    /// No prover is configured, or the prover could not be reached.
    #[error("proof unavailable: {0}")]
    Unavailable(String),

    /// Existing proof hints are not a JSON object.
    #[error("malformed proof hints: {0}")]
    MalformedHints(String),

    /// The prover ran and failed.
    #[error("proof generation failed: {0}")]
    GenerationFailed(String),

    /// The prover's public signals do not start with the commitment.
    #[error("prover returned public input {found:?}, expected commitment {expected}")]
    InconsistentPublicInputs { expected: String, found: String },
}

/// Error during proof verification.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The proof object does not have the shape this system produces.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// The proof was produced by a different scheme.
    #[error("unsupported proof scheme: {0}")]
    UnsupportedScheme(String),

    /// No verifier is configured.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

impl From<ProofError> for SigilError {
    fn from(err: ProofError) -> Self {
        match err {
            ProofError::Unavailable(msg) => SigilError::ProofUnavailable(msg),
            other => SigilError::ProofUnavailable(other.to_string()),
        }
    }
}

/// Raw prover output.
#[derive(Debug, Clone, PartialEq)]
pub struct ProverOutput {
    /// Opaque proof object, embedded verbatim as `zkProof`.
    pub proof: Value,
    /// Public signals in prover order. Index 0 is the commitment.
    pub public_signals: Vec<String>,
}

/// Abstract interface for a zero-knowledge proof backend.
#[async_trait]
pub trait ProofSystem: Send + Sync {
    /// Scheme label written into proof hints, e.g. `"groth16"`.
    fn scheme(&self) -> &str;

    /// Prove knowledge of `secret` opening `commitment`.
    async fn prove(
        &self,
        commitment: &Commitment,
        secret: &CommitmentSecret,
    ) -> Result<ProverOutput, ProofError>;

    /// Verify `proof` against `public_inputs`.
    async fn verify(&self, proof: &Value, public_inputs: &[String]) -> Result<bool, VerifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_keeps_message_prefix() {
        let err = ProofError::Unavailable("no prover configured".into());
        assert_eq!(err.to_string(), "proof unavailable: no prover configured");
        let sigil: SigilError = err.into();
        assert_eq!(sigil.to_string(), "proof unavailable: no prover configured");
    }

    #[test]
    fn other_failures_surface_as_proof_unavailable() {
        let sigil: SigilError = ProofError::MalformedHints("expected object".into()).into();
        assert!(matches!(sigil, SigilError::ProofUnavailable(_)));
        assert!(sigil.to_string().contains("malformed proof hints"));
    }
}
