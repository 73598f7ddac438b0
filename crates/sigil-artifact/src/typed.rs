//! Typed payload schemas, one struct per version.
//!
//! [`TypedPayload`] is the total view over a payload's domain fields,
//! discriminated by `v`. Builders (mint, claim derivation) construct these
//! and convert into a [`SigilPayload`]; readers convert the other way to
//! validate. Fields not named by a schema ride along in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::payload::{PayloadError, PayloadVersion, SigilPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketOutcome {
    Yes,
    No,
    Void,
}

impl MarketOutcome {
    pub fn favors(&self, side: Side) -> bool {
        matches!(
            (self, side),
            (Self::Yes, Side::Yes) | (Self::No, Side::No)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPayload {
    pub market_id: String,
    pub side: Side,
    pub stake_micro: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares_micro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_pulse: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_phi_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kai_signature: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionPayload {
    pub market_id: String,
    pub outcome: MarketOutcome,
    pub resolved_pulse: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beat: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kai_signature: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPayload {
    pub claim_id: String,
    pub market_id: String,
    pub side: Side,
    pub outcome: MarketOutcome,
    pub won: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_micro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_micro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_pulse: Option<u64>,
    pub resolved_pulse: u64,
    /// Pulse at which the claim was made.
    pub pulse: u64,
    pub position_payload_hash: String,
    pub resolution_payload_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_phi_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultPayload {
    pub vault_id: String,
    pub user_phi_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake_micro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kai_signature: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProphecyPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prophecy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_pulse: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_phi_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kai_signature: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A payload resolved to its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "v")]
pub enum TypedPayload {
    #[serde(rename = "SM-POS-1")]
    Position(PositionPayload),
    #[serde(rename = "SM-RES-1")]
    Resolution(ResolutionPayload),
    #[serde(rename = "SM-CLAIM-1")]
    Claim(ClaimPayload),
    #[serde(rename = "SM-VAULT-1")]
    Vault(VaultPayload),
    #[serde(rename = "SM-PROP-1")]
    Prophecy(ProphecyPayload),
}

impl TypedPayload {
    pub fn version(&self) -> PayloadVersion {
        match self {
            Self::Position(_) => PayloadVersion::Position,
            Self::Resolution(_) => PayloadVersion::Resolution,
            Self::Claim(_) => PayloadVersion::Claim,
            Self::Vault(_) => PayloadVersion::Vault,
            Self::Prophecy(_) => PayloadVersion::Prophecy,
        }
    }

    /// Read the body of `payload` against its schema.
    ///
    /// A body discriminated only by `kind` is read under the matching
    /// version. ZK and integrity fields end up in `extra`.
    pub fn from_payload(payload: &SigilPayload) -> Result<Self, PayloadError> {
        let version = payload.version()?;
        let mut body = payload.body().clone();
        body.insert("v".into(), Value::String(version.as_str().into()));
        serde_json::from_value(Value::Object(body)).map_err(|e| PayloadError::Invalid(e.to_string()))
    }

    pub fn into_payload(self) -> Result<SigilPayload, PayloadError> {
        let value = serde_json::to_value(&self).map_err(|e| PayloadError::Invalid(e.to_string()))?;
        SigilPayload::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn position_reads_from_raw_payload() {
        let p = SigilPayload::from_value(json!({
            "v": "SM-POS-1",
            "marketId": "m1",
            "side": "YES",
            "stakeMicro": "1000000",
            "integrity": {"payloadHash": "h"},
            "label": "first"
        }))
        .unwrap();
        match TypedPayload::from_payload(&p).unwrap() {
            TypedPayload::Position(pos) => {
                assert_eq!(pos.market_id, "m1");
                assert_eq!(pos.side, Side::Yes);
                assert_eq!(pos.extra.get("label"), Some(&json!("first")));
                assert!(pos.extra.contains_key("integrity"));
            }
            other => panic!("expected position, got {other:?}"),
        }
    }

    #[test]
    fn kind_only_body_uses_matching_schema() {
        let p = SigilPayload::from_value(json!({
            "kind": "vault",
            "vaultId": "v1",
            "userPhiKey": "phi"
        }))
        .unwrap();
        let typed = TypedPayload::from_payload(&p).unwrap();
        assert_eq!(typed.version(), PayloadVersion::Vault);
    }

    #[test]
    fn missing_required_field_is_invalid() {
        let p = SigilPayload::from_value(json!({"v": "SM-POS-1", "marketId": "m1"})).unwrap();
        assert!(matches!(
            TypedPayload::from_payload(&p),
            Err(PayloadError::Invalid(_))
        ));
    }

    #[test]
    fn into_payload_carries_discriminator() {
        let typed = TypedPayload::Prophecy(ProphecyPayload {
            text: "rain at dawn".into(),
            prophecy_id: None,
            expiration_pulse: Some(1_000),
            pulse: None,
            user_phi_key: None,
            kai_signature: None,
            extra: Map::new(),
        });
        let p = typed.into_payload().unwrap();
        assert_eq!(p.get_str("v"), Some("SM-PROP-1"));
        assert_eq!(p.body().get("expirationPulse"), Some(&json!(1_000)));
        assert!(!p.body().contains_key("prophecyId"));
    }

    #[test]
    fn outcome_favors_matching_side_only() {
        assert!(MarketOutcome::Yes.favors(Side::Yes));
        assert!(!MarketOutcome::No.favors(Side::Yes));
        assert!(!MarketOutcome::Void.favors(Side::No));
    }
}
