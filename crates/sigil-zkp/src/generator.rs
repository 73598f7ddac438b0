//! # Proof Generator
//!
//! Wraps an optional [`ProofSystem`] and enforces the proof record contract:
//! `zkPublicInputs[0]` is the commitment, hints are well-formed before the
//! prover is ever called, and a missing prover is a typed failure rather
//! than an empty proof.
//!
//! Two calls for the same commitment may produce different proof encodings;
//! both verify against the same public inputs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sigil_crypto::{Commitment, CommitmentSecret};

use crate::hints::{HintDefaults, ProofHints};
use crate::traits::{ProofError, ProofSystem, VerifyError};

/// A generated proof with its public inputs and hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    pub proof: Value,
    pub zk_public_inputs: Vec<String>,
    pub proof_hints: ProofHints,
}

/// Produces [`ProofRecord`]s through a pluggable prover.
#[derive(Clone, Default)]
pub struct ProofGenerator {
    system: Option<Arc<dyn ProofSystem>>,
    defaults: HintDefaults,
}

impl std::fmt::Debug for ProofGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofGenerator")
            .field("scheme", &self.system.as_ref().map(|s| s.scheme().to_string()))
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl ProofGenerator {
    pub fn new(system: Arc<dyn ProofSystem>) -> Self {
        Self {
            system: Some(system),
            defaults: HintDefaults::default(),
        }
    }

    /// A generator with no prover. Every `generate` call fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: HintDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn is_available(&self) -> bool {
        self.system.is_some()
    }

    /// Scheme label of the configured prover, if any.
    pub fn scheme(&self) -> Option<&str> {
        self.system.as_deref().map(|s| s.scheme())
    }

    /// Generate a fresh proof for `commitment`.
    pub async fn generate(
        &self,
        commitment: &Commitment,
        secret: &CommitmentSecret,
        existing_hints: Option<&Value>,
    ) -> Result<ProofRecord, ProofError> {
        let system = self
            .system
            .as_ref()
            .ok_or_else(|| ProofError::Unavailable("no prover configured".into()))?;
        let proof_hints =
            ProofHints::build(existing_hints, system.scheme(), commitment.as_str(), &self.defaults)?;

        tracing::debug!(commitment = %commitment, scheme = system.scheme(), "generating proof");
        let output = system.prove(commitment, secret).await?;

        let zk_public_inputs = if output.public_signals.is_empty() {
            vec![commitment.as_str().to_string()]
        } else {
            let first = &output.public_signals[0];
            if !commitment.matches(first) {
                return Err(ProofError::InconsistentPublicInputs {
                    expected: commitment.as_str().to_string(),
                    found: first.clone(),
                });
            }
            output.public_signals
        };

        Ok(ProofRecord {
            proof: output.proof,
            zk_public_inputs,
            proof_hints,
        })
    }

    /// Recompute hints for a proof that is being reused.
    pub fn refresh_hints(
        &self,
        existing_hints: Option<&Value>,
        commitment: &Commitment,
    ) -> Result<ProofHints, ProofError> {
        let scheme = match (self.scheme(), existing_hints.and_then(|h| h.get("scheme"))) {
            (Some(s), _) => s.to_string(),
            (None, Some(Value::String(s))) => s.clone(),
            (None, _) => "unknown".to_string(),
        };
        ProofHints::build(existing_hints, &scheme, commitment.as_str(), &self.defaults)
    }

    /// Verify a proof through the configured system.
    pub async fn verify(&self, proof: &Value, public_inputs: &[String]) -> Result<bool, VerifyError> {
        match &self.system {
            Some(system) => system.verify(proof, public_inputs).await,
            None => Err(VerifyError::Unavailable("no prover configured".into())),
        }
    }
}
