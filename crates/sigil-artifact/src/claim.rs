//! Claim finalization.
//!
//! A claim is a new `SM-CLAIM-1` payload derived from a position and the
//! resolution of the same market. It records both source payload hashes so
//! a verifier can walk back to the artifacts it came from. The derived
//! payload carries no proof until it is sealed.

use serde_json::Map;

use sigil_core::{sha256_hex, CanonicalBytes};

use crate::payload::{PayloadError, SigilPayload};
use crate::typed::{ClaimPayload, TypedPayload};

/// Derive a claim from a position and its market's resolution.
pub fn derive_claim(
    position: &SigilPayload,
    resolution: &SigilPayload,
    claim_pulse: u64,
    payout_micro: Option<String>,
) -> Result<SigilPayload, PayloadError> {
    let pos = match TypedPayload::from_payload(position)? {
        TypedPayload::Position(p) => p,
        other => {
            return Err(PayloadError::Invalid(format!(
                "expected a position, found {}",
                other.version()
            )))
        }
    };
    let res = match TypedPayload::from_payload(resolution)? {
        TypedPayload::Resolution(r) => r,
        other => {
            return Err(PayloadError::Invalid(format!(
                "expected a resolution, found {}",
                other.version()
            )))
        }
    };
    if pos.market_id != res.market_id {
        return Err(PayloadError::MarketMismatch {
            position: pos.market_id,
            resolution: res.market_id,
        });
    }

    let position_payload_hash = position.payload_hash()?;
    let resolution_payload_hash = resolution.payload_hash()?;
    let claim_id = claim_id(&position_payload_hash, &resolution_payload_hash, claim_pulse)?;

    let won = res.outcome.favors(pos.side);
    let claim = ClaimPayload {
        claim_id,
        market_id: pos.market_id,
        side: pos.side,
        outcome: res.outcome,
        won,
        position_id: pos.position_id,
        stake_micro: Some(pos.stake_micro),
        payout_micro: if won { payout_micro } else { None },
        open_pulse: pos.open_pulse.or(pos.pulse),
        resolved_pulse: res.resolved_pulse,
        pulse: claim_pulse,
        position_payload_hash,
        resolution_payload_hash,
        user_phi_key: pos.user_phi_key,
        extra: Map::new(),
    };
    tracing::debug!(claim_id = %claim.claim_id, won, "derived claim");
    TypedPayload::Claim(claim).into_payload()
}

fn claim_id(position_hash: &str, resolution_hash: &str, pulse: u64) -> Result<String, PayloadError> {
    let canonical = CanonicalBytes::new(&serde_json::json!({
        "position": position_hash,
        "resolution": resolution_hash,
        "pulse": pulse,
    }))?;
    Ok(format!("claim-{}", &sha256_hex(&canonical)[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{PayloadVersion, SigilKind};
    use serde_json::json;

    fn position(side: &str) -> SigilPayload {
        SigilPayload::from_value(json!({
            "v": "SM-POS-1",
            "marketId": "m1",
            "side": side,
            "stakeMicro": "1000000",
            "positionId": "p1",
            "openPulse": 100
        }))
        .unwrap()
    }

    fn resolution(market: &str, outcome: &str) -> SigilPayload {
        SigilPayload::from_value(json!({
            "v": "SM-RES-1",
            "marketId": market,
            "outcome": outcome,
            "resolvedPulse": 900
        }))
        .unwrap()
    }

    #[test]
    fn winning_claim_records_sources() {
        let pos = position("YES");
        let res = resolution("m1", "YES");
        let claim = derive_claim(&pos, &res, 1000, Some("1900000".into())).unwrap();
        assert_eq!(claim.version().unwrap(), PayloadVersion::Claim);
        assert_eq!(claim.kind(), SigilKind::Claim);
        let body = claim.body();
        assert_eq!(body["won"], json!(true));
        assert_eq!(body["payoutMicro"], json!("1900000"));
        assert_eq!(body["openPulse"], json!(100));
        assert_eq!(body["resolvedPulse"], json!(900));
        assert_eq!(body["positionPayloadHash"], json!(pos.payload_hash().unwrap()));
        assert_eq!(body["resolutionPayloadHash"], json!(res.payload_hash().unwrap()));
        assert!(claim.zk_proof().is_none());
    }

    #[test]
    fn losing_claim_has_no_payout() {
        let claim = derive_claim(&position("NO"), &resolution("m1", "YES"), 1000, Some("5".into())).unwrap();
        assert_eq!(claim.body()["won"], json!(false));
        assert!(!claim.body().contains_key("payoutMicro"));
    }

    #[test]
    fn claim_id_is_deterministic() {
        let a = derive_claim(&position("YES"), &resolution("m1", "NO"), 7, None).unwrap();
        let b = derive_claim(&position("YES"), &resolution("m1", "NO"), 7, None).unwrap();
        assert_eq!(a.get_str("claimId"), b.get_str("claimId"));
        assert!(a.get_str("claimId").unwrap().starts_with("claim-"));
    }

    #[test]
    fn market_mismatch_is_rejected() {
        let err = derive_claim(&position("YES"), &resolution("m2", "YES"), 1, None).unwrap_err();
        assert!(matches!(err, PayloadError::MarketMismatch { .. }));
    }

    #[test]
    fn swapped_inputs_are_invalid() {
        let err = derive_claim(&resolution("m1", "YES"), &position("YES"), 1, None).unwrap_err();
        assert!(matches!(err, PayloadError::Invalid(_)));
    }
}
