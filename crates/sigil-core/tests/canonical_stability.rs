//! # Canonical Stability
//!
//! Key order must never leak into canonical bytes. The property tests emit
//! the same logical document with object keys permuted at every nesting
//! level, both as JSON text and as a serializer that hands keys to JCS in
//! that order, and compare against an independently rendered sorted form.

use proptest::prelude::*;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use sigil_core::{sha256_hex, CanonicalBytes, EncodingError, MAX_CANONICAL_DEPTH};

/// Render `value` as JSON text, visiting object keys in an order derived
/// from `seed` (rotated, and reversed on odd levels).
fn permuted_text(value: &Value, seed: u64) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            if !keys.is_empty() {
                let n = keys.len();
                keys.rotate_left((seed % n as u64) as usize);
                if seed & 1 == 1 {
                    keys.reverse();
                }
            }
            let next = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            let body: Vec<String> = keys
                .iter()
                .map(|k| format!("{} : {}", Value::String((*k).clone()), permuted_text(&map[*k], next)))
                .collect();
            format!("{{ {} }}", body.join(" , "))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(|v| permuted_text(v, seed ^ 0x9e37)).collect();
            format!("[{}]", body.join(", "))
        }
        leaf => leaf.to_string(),
    }
}

/// Serializes a value with object keys in the same permuted order as
/// [`permuted_text`], without going through a sorted map.
struct Permuted<'a>(&'a Value, u64);

impl Serialize for Permuted<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Permuted(value, seed) = *self;
        match value {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                if !keys.is_empty() {
                    let n = keys.len();
                    keys.rotate_left((seed % n as u64) as usize);
                    if seed & 1 == 1 {
                        keys.reverse();
                    }
                }
                let next = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
                let mut out = serializer.serialize_map(Some(keys.len()))?;
                for k in keys {
                    out.serialize_entry(k, &Permuted(&map[k], next))?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(&Permuted(item, seed ^ 0x9e37))?;
                }
                out.end()
            }
            leaf => leaf.serialize(serializer),
        }
    }
}

/// Sorted, compact rendering written without the canonicalizer. Keys in
/// these tests are ASCII, so byte order equals UTF-16 order.
fn sorted_text(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body: Vec<String> = keys
                .iter()
                .map(|k| format!("{}:{}", Value::String((*k).clone()), sorted_text(&map[*k])))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(sorted_text).collect();
            format!("[{}]", body.join(","))
        }
        leaf => leaf.to_string(),
    }
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1_000_000_000i64..1_000_000_000).prop_map(|n| serde_json::json!(n)),
        "[a-zA-Z0-9_ ]{0,24}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn permuted_key_order_produces_sorted_bytes(value in json_value(), seed in any::<u64>()) {
        let text = permuted_text(&value, seed);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        let a = CanonicalBytes::new(&parsed).unwrap();
        prop_assert_eq!(a.as_str(), sorted_text(&value));

        let other: Value = serde_json::from_str(&permuted_text(&value, seed.rotate_left(17) ^ 1)).unwrap();
        let b = CanonicalBytes::new(&other).unwrap();
        prop_assert_eq!(a.as_bytes(), b.as_bytes());
        prop_assert_eq!(sha256_hex(&a), sha256_hex(&b));
    }

    #[test]
    fn serializer_key_order_never_reaches_the_output(value in json_value(), seed in any::<u64>()) {
        let expected = sorted_text(&value);
        let direct = serde_jcs::to_string(&Permuted(&value, seed)).unwrap();
        prop_assert_eq!(&direct, &expected);
        let cb = CanonicalBytes::new(&Permuted(&value, seed)).unwrap();
        prop_assert_eq!(cb.as_str(), expected);
    }

    #[test]
    fn canonical_output_reparses_to_same_value(value in json_value()) {
        let cb = CanonicalBytes::from_value(&value).unwrap();
        let back: Value = serde_json::from_slice(cb.as_bytes()).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn canonicalization_is_idempotent(value in json_value()) {
        let once = CanonicalBytes::from_value(&value).unwrap();
        let reparsed: Value = serde_json::from_slice(once.as_bytes()).unwrap();
        let twice = CanonicalBytes::from_value(&reparsed).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn nesting_past_limit_is_rejected(extra in 1usize..8) {
        let mut v = serde_json::json!(0);
        for _ in 0..(MAX_CANONICAL_DEPTH + extra) {
            v = Value::Array(vec![v]);
        }
        let rejected = matches!(
            CanonicalBytes::from_value(&v),
            Err(EncodingError::DepthExceeded { .. })
        );
        prop_assert!(rejected);
    }
}

#[test]
fn known_position_payload_digest_is_stable() {
    let a = serde_json::json!({
        "v": "SM-POS-1",
        "marketId": "m1",
        "side": "YES",
        "stakeMicro": "1000000"
    });
    let b: Value = serde_json::from_str(
        r#"{"stakeMicro":"1000000","side":"YES","marketId":"m1","v":"SM-POS-1"}"#,
    )
    .unwrap();
    let ca = CanonicalBytes::from_value(&a).unwrap();
    assert_eq!(
        ca.as_str(),
        r#"{"marketId":"m1","side":"YES","stakeMicro":"1000000","v":"SM-POS-1"}"#
    );
    assert_eq!(sha256_hex(&ca), sha256_hex(&CanonicalBytes::from_value(&b).unwrap()));
}
