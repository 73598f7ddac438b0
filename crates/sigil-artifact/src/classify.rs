//! # Sigil Kind Classifier
//!
//! Determines what an artifact is and flattens its key fields into a
//! string map for display.
//!
//! ## Precedence
//!
//! 1. root `data-kind`, then root `data-v` (no JSON parse needed)
//! 2. payload `v`/`kind` (including an envelope header)
//! 3. otherwise `unknown`
//!
//! ## Fields
//!
//! [`FIELD_RULES`] is an ordered list. Each rule names an output key, the
//! root attributes to try (synonyms in order), then payload paths to try,
//! each also looked up under `payload.`. The first non-empty scalar wins.
//! Consumers depend on these exact output key names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::{SigilKind, SigilPayload};

/// One output field and where to look for it.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub attrs: &'static [&'static str],
    pub paths: &'static [&'static str],
}

impl FieldRule {
    /// The canonical mirrored attribute for this field.
    pub fn primary_attr(&self) -> Option<&'static str> {
        self.attrs.first().copied()
    }
}

macro_rules! rule {
    ($name:literal, [$($attr:literal),* $(,)?], [$($path:literal),* $(,)?]) => {
        FieldRule {
            name: $name,
            attrs: &[$($attr),*],
            paths: &[$($path),*],
        }
    };
}

pub const FIELD_RULES: &[FieldRule] = &[
    rule!("marketId", ["data-market-id", "data-market"], ["marketId", "market.id"]),
    rule!("side", ["data-side", "data-position-side"], ["side", "position.side"]),
    rule!("stakeMicro", ["data-stake-micro", "data-stake"], ["stakeMicro", "stake"]),
    rule!("sharesMicro", ["data-shares-micro", "data-shares"], ["sharesMicro", "shares"]),
    rule!("positionId", ["data-position-id"], ["positionId", "position.id"]),
    rule!("vaultId", ["data-vault-id", "data-vault"], ["vaultId", "vault.id"]),
    rule!("lockId", ["data-lock-id"], ["lockId", "lock.id"]),
    rule!("outcome", ["data-outcome"], ["outcome", "resolution.outcome"]),
    rule!("resolvedPulse", ["data-resolved-pulse"], ["resolvedPulse", "resolution.pulse"]),
    rule!("claimId", ["data-claim-id"], ["claimId"]),
    rule!("payoutMicro", ["data-payout-micro", "data-payout"], ["payoutMicro", "payout"]),
    rule!("prophecyId", ["data-prophecy-id"], ["prophecyId"]),
    rule!("text", ["data-text", "data-prophecy-text"], ["text", "prophecy.text"]),
    rule!(
        "expirationPulse",
        ["data-expiration-pulse", "data-expires-pulse"],
        ["expirationPulse", "expiresAtPulse"]
    ),
    rule!("pulse", ["data-pulse"], ["pulse", "openPulse", "openedAt.pulse"]),
    rule!("beat", ["data-beat"], ["beat", "openedAt.beat"]),
    rule!("stepIndex", ["data-step-index", "data-step"], ["stepIndex", "openedAt.stepIndex"]),
    rule!(
        "userPhiKey",
        ["data-user-phikey", "data-phikey", "data-user-phi-key"],
        ["userPhiKey", "phiKey", "identity.userPhiKey"]
    ),
    rule!("kaiSignature", ["data-kai-signature"], ["kaiSignature", "identity.kaiSignature"]),
    rule!("payloadHash", ["data-payload-hash"], ["integrity.payloadHash", "payloadHash"]),
    rule!("zkPoseidonHash", ["data-zk-poseidon-hash", "data-poseidon-hash"], ["zkPoseidonHash"]),
    rule!("v", ["data-v"], ["v", "header.v"]),
];

/// Result of classification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub kind: SigilKind,
    pub fields: BTreeMap<String, String>,
}

/// Classify an artifact from its root attributes and optional payload.
pub fn classify(attrs: &BTreeMap<String, String>, payload: Option<&SigilPayload>) -> Classification {
    let kind = ["data-kind", "data-v"]
        .iter()
        .filter_map(|a| attrs.get(*a))
        .find_map(|v| SigilKind::from_discriminator(v))
        .or_else(|| payload.map(SigilPayload::kind).filter(SigilKind::is_known))
        .unwrap_or(SigilKind::Unknown);

    let mut fields = BTreeMap::new();
    for rule in FIELD_RULES {
        let from_attr = rule
            .attrs
            .iter()
            .filter_map(|a| attrs.get(*a))
            .find(|v| !v.trim().is_empty())
            .cloned();
        if let Some(value) = from_attr.or_else(|| payload.and_then(|p| payload_value(p, rule))) {
            fields.insert(rule.name.to_string(), value);
        }
    }
    Classification { kind, fields }
}

/// The value a rule reads from the payload alone.
pub fn payload_value(payload: &SigilPayload, rule: &FieldRule) -> Option<String> {
    rule.paths.iter().find_map(|path| {
        payload
            .lookup(path)
            .and_then(scalar)
            .or_else(|| payload.lookup(&format!("payload.{path}")).and_then(scalar))
    })
}

/// Root attributes mirrored from a payload: `data-kind`, `data-v`, then
/// each rule's primary attribute that has a payload value.
pub fn mirrored_attributes(payload: &SigilPayload) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let kind = payload.kind();
    if kind.is_known() {
        out.push(("data-kind".to_string(), kind.as_str().to_string()));
    }
    for rule in FIELD_RULES {
        let Some(attr) = rule.primary_attr() else {
            continue;
        };
        if let Some(value) = payload_value(payload, rule) {
            out.push((attr.to_string(), value));
        }
    }
    out
}

/// Root attributes whose value disagrees with the payload.
///
/// Returns `(attribute, attribute value, payload value)` triples.
pub fn stale_attributes(
    attrs: &BTreeMap<String, String>,
    payload: &SigilPayload,
) -> Vec<(String, String, String)> {
    let mut stale = Vec::new();
    for rule in FIELD_RULES {
        let Some(expected) = payload_value(payload, rule) else {
            continue;
        };
        for attr in rule.attrs {
            if let Some(actual) = attrs.get(*attr) {
                if actual.trim() != expected {
                    stale.push((attr.to_string(), actual.clone(), expected.clone()));
                }
            }
        }
    }
    stale
}

fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
