//! # Mock Proof System
//!
//! A transparent "prover" for development, tests and the CLI. Proofs are
//! SHA-256 digests over the canonical circuit statement plus a random nonce.
//! They verify, but provide **no zero-knowledge guarantees**.
//!
//! ## How It Works
//!
//! ```text
//! statement = canonical({"circuit": CIRCUIT_ID, "publicInputs": [commitment]})
//! digest    = SHA256(statement || nonce)
//! proof     = {"protocol", "circuit", "nonce", "digest"}
//! ```
//!
//! The nonce makes two proofs of the same statement differ, as a real prover
//! with blinding randomness would. Verification recomputes the digest.
//!
//! ## Security Warning
//!
//! **NOT PRIVATE.** Anyone can recompute a proof from the public inputs. The
//! commitment secret is accepted and ignored; it is never copied into the
//! proof object.

use async_trait::async_trait;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use sigil_core::{CanonicalBytes, ContentDigest, Sha256Accumulator};
use sigil_crypto::{Commitment, CommitmentSecret};

use crate::traits::{ProofError, ProofSystem, ProverOutput, VerifyError};

/// Protocol tag carried in every mock proof.
pub const MOCK_PROTOCOL: &str = "sigil-mock-sha256";

/// Identifier of the commitment-opening statement.
pub const CIRCUIT_ID: &str = "sigil-commitment-v1";

/// Wire shape of a mock proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockProof {
    pub protocol: String,
    pub circuit: String,
    /// 32 hex chars of prover randomness.
    pub nonce: String,
    /// `SHA256(statement || nonce)` in hex.
    pub digest: String,
}

/// Transparent SHA-256 prover.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockProofSystem;

impl MockProofSystem {
    fn statement(public_inputs: &[String]) -> Result<CanonicalBytes, String> {
        CanonicalBytes::from_value(&json!({
            "circuit": CIRCUIT_ID,
            "publicInputs": public_inputs,
        }))
        .map_err(|e| format!("failed to canonicalize statement: {e}"))
    }

    // SHA-256 exception: the transcript is canonical bytes followed by the
    // raw nonce text, so it goes through the accumulator.
    fn digest(statement: &CanonicalBytes, nonce: &str) -> String {
        let mut acc = Sha256Accumulator::new();
        acc.update(statement.as_bytes());
        acc.update(nonce.as_bytes());
        acc.finalize_hex()
    }

    fn nonce() -> Result<String, ProofError> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| ProofError::Unavailable(format!("prover entropy: {e}")))?;
        Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }
}

#[async_trait]
impl ProofSystem for MockProofSystem {
    fn scheme(&self) -> &str {
        MOCK_PROTOCOL
    }

    async fn prove(
        &self,
        commitment: &Commitment,
        _secret: &CommitmentSecret,
    ) -> Result<ProverOutput, ProofError> {
        let public_signals = vec![commitment.as_str().to_string()];
        let statement = Self::statement(&public_signals).map_err(ProofError::GenerationFailed)?;
        let nonce = Self::nonce()?;
        let proof = MockProof {
            protocol: MOCK_PROTOCOL.to_string(),
            circuit: CIRCUIT_ID.to_string(),
            digest: Self::digest(&statement, &nonce),
            nonce,
        };
        let proof = serde_json::to_value(&proof)
            .map_err(|e| ProofError::GenerationFailed(e.to_string()))?;
        Ok(ProverOutput {
            proof,
            public_signals,
        })
    }

    async fn verify(&self, proof: &Value, public_inputs: &[String]) -> Result<bool, VerifyError> {
        let proof: MockProof = serde_json::from_value(proof.clone())
            .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;
        if proof.protocol != MOCK_PROTOCOL {
            return Err(VerifyError::UnsupportedScheme(proof.protocol));
        }
        if proof.circuit != CIRCUIT_ID {
            return Ok(false);
        }
        if ContentDigest::from_hex(&proof.digest).is_err() {
            return Err(VerifyError::MalformedProof(
                "digest must be 64 hex chars".into(),
            ));
        }
        let statement = Self::statement(public_inputs).map_err(VerifyError::MalformedProof)?;
        Ok(Self::digest(&statement, &proof.nonce) == proof.digest.to_ascii_lowercase())
    }
}
