//! # Proof Sealing
//!
//! Makes sure a payload carries a proof bound to its current payload hash.
//!
//! ```text
//! pin payloadHash ─▶ commit ─▶ hasValidProof? ──yes──▶ refresh hints (Reused)
//!                                   │
//!                                   no
//!                                   ▼
//!                            generate + attach (Generated)
//! ```
//!
//! ## Concurrency
//!
//! The validity check and the generate/attach step are not atomic. Sealing
//! the same artifact from two tasks at once can generate two proofs and
//! keep whichever is written last. Callers serialize seal/export calls per
//! artifact; calls on different artifacts need no coordination.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sigil_core::SigilError;
use sigil_crypto::{Commitment, Committer};
use sigil_zkp::ProofGenerator;

use crate::codec;
use crate::payload::SigilPayload;

/// Whether sealing ran the prover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SealStatus {
    Generated,
    Reused,
}

/// What a seal did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealReport {
    pub status: SealStatus,
    pub payload_hash: String,
    pub commitment: Commitment,
}

/// A sealed document with its payload.
#[derive(Debug, Clone)]
pub struct SealedSvg {
    pub svg: String,
    pub payload: SigilPayload,
    pub report: SealReport,
}

/// Binds payloads to proofs through one committer and one prover.
#[derive(Debug, Clone)]
pub struct SigilSealer {
    committer: Arc<Committer>,
    generator: ProofGenerator,
}

impl SigilSealer {
    pub fn new(committer: Arc<Committer>, generator: ProofGenerator) -> Self {
        Self {
            committer,
            generator,
        }
    }

    pub fn committer(&self) -> &Committer {
        &self.committer
    }

    pub fn generator(&self) -> &ProofGenerator {
        &self.generator
    }

    /// Attach or refresh the proof block of `payload` in place.
    ///
    /// On error the payload may have gained a pinned `integrity.payloadHash`
    /// but never a partial proof.
    pub async fn ensure_proof(&self, payload: &mut SigilPayload) -> Result<SealReport, SigilError> {
        if !payload.is_plausible() {
            return Err(SigilError::missing_metadata_for_proof());
        }
        let payload_hash = payload.pin_payload_hash()?;
        let pair = self.committer.commit(&payload_hash)?;

        if payload.has_valid_proof(&pair.commitment) {
            let hints = self
                .generator
                .refresh_hints(payload.proof_hints(), &pair.commitment)?;
            payload.set_proof_hints(&pair.commitment, &hints);
            tracing::debug!(payload_hash = %payload_hash, "reusing embedded proof");
            return Ok(SealReport {
                status: SealStatus::Reused,
                payload_hash,
                commitment: pair.commitment,
            });
        }

        let record = self
            .generator
            .generate(&pair.commitment, &pair.secret, payload.proof_hints())
            .await?;
        payload.attach_proof(&pair.commitment, &record);
        tracing::debug!(payload_hash = %payload_hash, commitment = %pair.commitment, "attached fresh proof");
        Ok(SealReport {
            status: SealStatus::Generated,
            payload_hash,
            commitment: pair.commitment,
        })
    }

    /// Extract, seal and re-embed the payload of an SVG document.
    ///
    /// Only a sigil `<metadata>` block can be rewritten, so a payload found
    /// only in `<desc>` fails before the prover runs.
    pub async fn seal_svg(&self, svg: &str) -> Result<SealedSvg, SigilError> {
        let mut payload =
            codec::extract_metadata(svg).ok_or_else(SigilError::missing_metadata_for_proof)?;
        let report = self.ensure_proof(&mut payload).await?;
        let svg = codec::embed(svg, &payload)?;
        Ok(SealedSvg {
            svg,
            payload,
            report,
        })
    }
}
