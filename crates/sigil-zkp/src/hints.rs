//! # Proof Hints
//!
//! Serializable, non-secret metadata that travels with a proof: which
//! scheme produced it, where a verifier API lives, and an explorer link for
//! the commitment. Hosts may add their own keys; those survive every
//! refresh.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::traits::ProofError;

pub const DEFAULT_PROOF_API: &str = "/api/proof/sigil";
pub const DEFAULT_EXPLORER_BASE: &str = "/keystream/hash/";

/// Endpoints used when no existing hints override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintDefaults {
    pub api: String,
    pub explorer_base: String,
}

impl Default for HintDefaults {
    fn default() -> Self {
        Self {
            api: DEFAULT_PROOF_API.to_string(),
            explorer_base: DEFAULT_EXPLORER_BASE.to_string(),
        }
    }
}

/// The `proofHints` block embedded next to `zkProof`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofHints {
    pub scheme: String,
    pub api: String,
    pub explorer: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProofHints {
    /// Build hints for `commitment`, merging `existing` hints.
    ///
    /// `scheme` and `explorer` are always recomputed; `api` and any unknown
    /// keys are kept from `existing`. A JSON `null` counts as absent; any
    /// other non-object is malformed.
    pub fn build(
        existing: Option<&Value>,
        scheme: &str,
        commitment: &str,
        defaults: &HintDefaults,
    ) -> Result<Self, ProofError> {
        let mut extra = match existing {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(ProofError::MalformedHints(format!(
                    "expected an object, found {}",
                    json_kind(other)
                )))
            }
        };
        extra.remove("scheme");
        extra.remove("explorer");
        let api = match extra.remove("api") {
            Some(Value::String(api)) if !api.is_empty() => api,
            _ => defaults.api.clone(),
        };
        Ok(Self {
            scheme: scheme.to_string(),
            api,
            explorer: format!("{}{}", defaults.explorer_base, commitment),
            extra,
        })
    }

    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("scheme".into(), Value::String(self.scheme.clone()));
        map.insert("api".into(), Value::String(self.api.clone()));
        map.insert("explorer".into(), Value::String(self.explorer.clone()));
        Value::Object(map)
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_when_absent() {
        let h = ProofHints::build(None, "groth16", "abc", &HintDefaults::default()).unwrap();
        assert_eq!(h.scheme, "groth16");
        assert_eq!(h.api, "/api/proof/sigil");
        assert_eq!(h.explorer, "/keystream/hash/abc");
        assert!(h.extra.is_empty());
    }

    #[test]
    fn null_is_treated_as_absent() {
        let h = ProofHints::build(Some(&Value::Null), "s", "c", &HintDefaults::default());
        assert!(h.is_ok());
    }

    #[test]
    fn existing_api_and_extra_keys_survive() {
        let existing = json!({
            "api": "https://verifier.example/api",
            "explorer": "/stale/link",
            "scheme": "old",
            "label": "genesis"
        });
        let h = ProofHints::build(Some(&existing), "groth16", "c0ffee", &HintDefaults::default())
            .unwrap();
        assert_eq!(h.api, "https://verifier.example/api");
        assert_eq!(h.explorer, "/keystream/hash/c0ffee");
        assert_eq!(h.scheme, "groth16");
        assert_eq!(h.extra.get("label"), Some(&json!("genesis")));
    }

    #[test]
    fn non_object_hints_are_malformed() {
        let err = ProofHints::build(Some(&json!([1, 2])), "s", "c", &HintDefaults::default())
            .unwrap_err();
        assert!(matches!(err, ProofError::MalformedHints(ref m) if m.contains("array")));
    }

    #[test]
    fn serde_flattens_extra_keys() {
        let h = ProofHints::build(Some(&json!({"label": "x"})), "s", "c", &HintDefaults::default())
            .unwrap();
        let v = serde_json::to_value(&h).unwrap();
        assert_eq!(v, h.to_value());
        assert_eq!(v["label"], "x");
        let back: ProofHints = serde_json::from_value(v).unwrap();
        assert_eq!(back, h);
    }
}
