//! # Sigil Payload
//!
//! The JSON record embedded in an artifact. Two shapes are accepted:
//!
//! - **flat**: `{ "v": "SM-POS-1", "marketId": …, "integrity": {…}, "zkProof": … }`
//! - **envelope**: `{ "header": {…}, "payload": {…}, "integrity": {…} }`, where
//!   domain fields and ZK fields live in the inner `payload` object.
//!
//! [`SigilPayload`] keeps the raw JSON map as the source of truth so that
//! unknown fields round-trip untouched. The version discriminator is
//! resolved into the closed [`PayloadVersion`] sum type on demand, and
//! unknown discriminators are rejected explicitly.
//!
//! ## Payload hash
//!
//! `integrity.payloadHash` is trusted when present. Otherwise the hash is
//! `SHA-256(canonical(body − ZK fields − integrity))`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use sigil_core::{sha256_hex, CanonicalBytes, DigestAlgorithm, EncodingError, SigilError};
use sigil_crypto::Commitment;
use sigil_zkp::{ProofHints, ProofRecord};

pub const ZK_PROOF: &str = "zkProof";
pub const ZK_PUBLIC_INPUTS: &str = "zkPublicInputs";
pub const ZK_POSEIDON_HASH: &str = "zkPoseidonHash";
pub const PROOF_HINTS: &str = "proofHints";
pub const INTEGRITY: &str = "integrity";
pub const PAYLOAD_HASH: &str = "payloadHash";

/// Fields attached or refreshed by sealing. Excluded from the payload hash.
pub const ZK_FIELDS: [&str; 4] = [ZK_PROOF, ZK_PUBLIC_INPUTS, ZK_POSEIDON_HASH, PROOF_HINTS];

const ENVELOPE_KEYS: [&str; 3] = ["header", "payload", "integrity"];

/// Errors from payload interpretation.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("unknown payload version {0:?}")]
    UnknownVersion(String),

    #[error("payload has no v/kind discriminator")]
    MissingDiscriminator,

    #[error("expected a JSON object at {0}")]
    NotAnObject(String),

    #[error("invalid payload: {0}")]
    Invalid(String),

    #[error("claim sources disagree on market: position {position:?}, resolution {resolution:?}")]
    MarketMismatch { position: String, resolution: String },

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl From<PayloadError> for SigilError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Encoding(e) => SigilError::Encoding(e),
            other => SigilError::Payload(other.to_string()),
        }
    }
}

/// The five payload schema versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadVersion {
    #[serde(rename = "SM-POS-1")]
    Position,
    #[serde(rename = "SM-RES-1")]
    Resolution,
    #[serde(rename = "SM-CLAIM-1")]
    Claim,
    #[serde(rename = "SM-VAULT-1")]
    Vault,
    #[serde(rename = "SM-PROP-1")]
    Prophecy,
}

impl PayloadVersion {
    pub const ALL: [Self; 5] = [
        Self::Position,
        Self::Resolution,
        Self::Claim,
        Self::Vault,
        Self::Prophecy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "SM-POS-1",
            Self::Resolution => "SM-RES-1",
            Self::Claim => "SM-CLAIM-1",
            Self::Vault => "SM-VAULT-1",
            Self::Prophecy => "SM-PROP-1",
        }
    }

    pub fn kind(&self) -> SigilKind {
        match self {
            Self::Position => SigilKind::Position,
            Self::Resolution => SigilKind::Resolution,
            Self::Claim => SigilKind::Claim,
            Self::Vault => SigilKind::Vault,
            Self::Prophecy => SigilKind::Prophecy,
        }
    }

    pub fn for_kind(kind: SigilKind) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.kind() == kind)
    }

    /// Parse a version string, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, PayloadError> {
        let t = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(t))
            .ok_or_else(|| PayloadError::UnknownVersion(t.to_string()))
    }
}

impl std::str::FromStr for PayloadVersion {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PayloadVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an artifact represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SigilKind {
    Position,
    Claim,
    Resolution,
    Vault,
    Prophecy,
    #[default]
    Unknown,
}

impl SigilKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Claim => "claim",
            Self::Resolution => "resolution",
            Self::Vault => "vault",
            Self::Prophecy => "prophecy",
            Self::Unknown => "unknown",
        }
    }

    /// Resolve a discriminator that is either a kind label (`"position"`)
    /// or a version string (`"SM-POS-1"`). Unrecognized values give `None`.
    pub fn from_discriminator(s: &str) -> Option<Self> {
        let t = s.trim();
        if let Ok(v) = PayloadVersion::parse(t) {
            return Some(v.kind());
        }
        match t.to_ascii_lowercase().as_str() {
            "position" => Some(Self::Position),
            "claim" => Some(Self::Claim),
            "resolution" => Some(Self::Resolution),
            "vault" => Some(Self::Vault),
            "prophecy" => Some(Self::Prophecy),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }
}

impl std::fmt::Display for SigilKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a JSON value looks like a sigil payload: a `v`/`kind` string
/// discriminator, or all three envelope keys.
pub fn is_plausible(value: &Value) -> bool {
    value.as_object().is_some_and(plausible_map)
}

fn plausible_map(obj: &Map<String, Value>) -> bool {
    let has_discriminator = ["v", "kind"]
        .iter()
        .any(|k| obj.get(*k).is_some_and(Value::is_string));
    has_discriminator || ENVELOPE_KEYS.iter().all(|k| obj.contains_key(*k))
}

/// An embedded sigil payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct SigilPayload {
    /// Domain and ZK fields. The whole object for flat payloads.
    body: Map<String, Value>,
    /// Envelope members other than `payload`; `None` for flat payloads.
    envelope: Option<Map<String, Value>>,
}

impl SigilPayload {
    /// Wrap any JSON object. Plausibility is checked separately.
    pub fn from_value(value: Value) -> Result<Self, PayloadError> {
        let Value::Object(mut root) = value else {
            return Err(PayloadError::NotAnObject("payload root".into()));
        };
        let envelope = ENVELOPE_KEYS.iter().all(|k| root.contains_key(*k));
        if !envelope {
            return Ok(Self {
                body: root,
                envelope: None,
            });
        }
        match root.remove("payload") {
            Some(Value::Object(body)) => Ok(Self {
                body,
                envelope: Some(root),
            }),
            _ => Err(PayloadError::NotAnObject("payload".into())),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, PayloadError> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| PayloadError::Invalid(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn is_envelope(&self) -> bool {
        self.envelope.is_some()
    }

    pub fn is_plausible(&self) -> bool {
        self.is_envelope() || plausible_map(&self.body)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.body
    }

    pub fn header(&self) -> Option<&Map<String, Value>> {
        self.envelope
            .as_ref()
            .and_then(|env| env.get("header"))
            .and_then(Value::as_object)
    }

    /// A string field of the body.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    /// Resolve a dotted path against the payload as embedded.
    ///
    /// For envelopes, a leading `payload.` addresses the body and other
    /// envelope members (`header`, `integrity`) are addressable by name;
    /// anything else resolves against the body.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        if let Some(env) = &self.envelope {
            if first == "payload" {
                return walk(self.body.get(segments.next()?)?, segments);
            }
            if let Some(member) = env.get(first) {
                return walk(member, segments);
            }
        }
        walk(self.body.get(first)?, segments)
    }

    /// The raw discriminator: body `v`, body `kind`, then header `v`/`kind`.
    pub fn discriminator(&self) -> Option<&str> {
        discriminator_of(&self.body).or_else(|| self.header().and_then(discriminator_of))
    }

    pub fn version(&self) -> Result<PayloadVersion, PayloadError> {
        let d = self.discriminator().ok_or(PayloadError::MissingDiscriminator)?;
        PayloadVersion::parse(d).or_else(|_| {
            SigilKind::from_discriminator(d)
                .and_then(PayloadVersion::for_kind)
                .ok_or_else(|| PayloadError::UnknownVersion(d.to_string()))
        })
    }

    pub fn kind(&self) -> SigilKind {
        self.discriminator()
            .and_then(SigilKind::from_discriminator)
            .unwrap_or_default()
    }

    pub fn integrity(&self) -> Option<&Map<String, Value>> {
        let holder = self.envelope.as_ref().unwrap_or(&self.body);
        holder.get(INTEGRITY).and_then(Value::as_object)
    }

    fn integrity_mut(&mut self) -> Result<&mut Map<String, Value>, PayloadError> {
        let holder = match &mut self.envelope {
            Some(env) => env,
            None => &mut self.body,
        };
        let entry = holder
            .entry(INTEGRITY)
            .or_insert_with(|| Value::Object(Map::new()));
        if entry.is_null() {
            *entry = Value::Object(Map::new());
        }
        entry
            .as_object_mut()
            .ok_or_else(|| PayloadError::NotAnObject(INTEGRITY.into()))
    }

    /// `integrity.payloadHash` when present and non-empty.
    pub fn declared_payload_hash(&self) -> Option<&str> {
        self.integrity()?
            .get(PAYLOAD_HASH)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }

    /// The object the payload hash is computed over.
    pub fn hash_basis(&self) -> Value {
        let mut basis = self.body.clone();
        for key in ZK_FIELDS.iter().chain(std::iter::once(&INTEGRITY)) {
            basis.remove(*key);
        }
        Value::Object(basis)
    }

    pub fn computed_payload_hash(&self) -> Result<String, PayloadError> {
        let canonical = CanonicalBytes::from_value(&self.hash_basis())?;
        Ok(sha256_hex(&canonical))
    }

    /// The pinned hash if declared, otherwise the computed one.
    pub fn payload_hash(&self) -> Result<String, PayloadError> {
        match self.declared_payload_hash() {
            Some(h) => Ok(h.to_string()),
            None => self.computed_payload_hash(),
        }
    }

    /// Make sure `integrity.payloadHash` is set, and return it.
    pub fn pin_payload_hash(&mut self) -> Result<String, PayloadError> {
        if let Some(h) = self.declared_payload_hash() {
            return Ok(h.to_string());
        }
        let hash = self.computed_payload_hash()?;
        let integrity = self.integrity_mut()?;
        integrity.insert(PAYLOAD_HASH.into(), Value::String(hash.clone()));
        integrity.insert(
            "algorithm".into(),
            Value::String(DigestAlgorithm::Sha256.as_str().into()),
        );
        Ok(hash)
    }

    /// `zkProof`, unless absent or null.
    pub fn zk_proof(&self) -> Option<&Value> {
        self.body.get(ZK_PROOF).filter(|v| !v.is_null())
    }

    /// `zkPublicInputs` rendered as strings, in order.
    pub fn zk_public_inputs(&self) -> Vec<String> {
        self.body
            .get(ZK_PUBLIC_INPUTS)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn zk_poseidon_hash(&self) -> Option<&str> {
        self.get_str(ZK_POSEIDON_HASH)
    }

    pub fn proof_hints(&self) -> Option<&Value> {
        self.body.get(PROOF_HINTS)
    }

    /// A proof is reusable when it exists and its first public input is
    /// the current commitment.
    pub fn has_valid_proof(&self, commitment: &Commitment) -> bool {
        self.zk_proof().is_some()
            && self
                .zk_public_inputs()
                .first()
                .is_some_and(|first| commitment.matches(first))
    }

    pub fn attach_proof(&mut self, commitment: &Commitment, record: &ProofRecord) {
        self.body.insert(ZK_PROOF.into(), record.proof.clone());
        self.body.insert(
            ZK_PUBLIC_INPUTS.into(),
            Value::Array(
                record
                    .zk_public_inputs
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
        self.set_proof_hints(commitment, &record.proof_hints);
    }

    /// Refresh hints and the commitment without touching the proof.
    pub fn set_proof_hints(&mut self, commitment: &Commitment, hints: &ProofHints) {
        self.body.insert(
            ZK_POSEIDON_HASH.into(),
            Value::String(commitment.as_str().to_string()),
        );
        self.body.insert(PROOF_HINTS.into(), hints.to_value());
    }

    /// The payload as embedded, with every ZK field removed.
    pub fn without_zk_fields(&self) -> Value {
        let mut copy = self.clone();
        for key in ZK_FIELDS {
            copy.body.remove(key);
        }
        copy.to_value()
    }

    pub fn to_value(&self) -> Value {
        match &self.envelope {
            Some(env) => {
                let mut root = env.clone();
                root.insert("payload".into(), Value::Object(self.body.clone()));
                Value::Object(root)
            }
            None => Value::Object(self.body.clone()),
        }
    }

    pub fn to_json_string(&self) -> Result<String, PayloadError> {
        serde_json::to_string(&self.to_value()).map_err(|e| PayloadError::Invalid(e.to_string()))
    }
}

impl TryFrom<Value> for SigilPayload {
    type Error = PayloadError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<SigilPayload> for Value {
    fn from(p: SigilPayload) -> Self {
        p.to_value()
    }
}

fn discriminator_of(m: &Map<String, Value>) -> Option<&str> {
    ["v", "kind"]
        .iter()
        .find_map(|k| m.get(*k).and_then(Value::as_str))
}

fn walk<'a>(mut cur: &'a Value, segments: std::str::Split<'_, char>) -> Option<&'a Value> {
    for seg in segments {
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}
