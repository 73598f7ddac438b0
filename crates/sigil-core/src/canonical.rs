//! # Canonical Serialization — JCS Byte Production
//!
//! Defines `CanonicalBytes`, the sole construction path for bytes that are
//! hashed anywhere in the sigil protocol: payload hashes, manifest hashes and
//! commitments all start here.
//!
//! ## Invariant
//!
//! Two structurally equal values produce byte-identical output regardless of
//! the insertion order of their object keys. Lists keep their order; objects
//! are emitted with sorted keys and compact separators (RFC 8785, via
//! `serde_jcs`). Numbers use the ECMAScript shortest round-trip form, which is
//! locale-independent.
//!
//! ## Grammar
//!
//! Anything that serializes through `serde_json::Value` is in the grammar:
//! null, bool, number, string, list, string-keyed map. Absent optional fields
//! must be skipped at the `Serialize` level (`skip_serializing_if`), never
//! emitted as `null` by accident. Dates go through [`crate::Timestamp`], which
//! serializes to a fixed ISO-8601 form. Owned `Value` trees cannot be cyclic,
//! so the only structural bound left to enforce is nesting depth.

use serde::Serialize;
use serde_json::Value;

use crate::error::EncodingError;

/// Maximum container nesting accepted by the canonicalizer.
pub const MAX_CANONICAL_DEPTH: usize = 64;

/// Bytes produced exclusively by JCS canonicalization.
///
/// The inner text is private; the only constructors are
/// [`CanonicalBytes::new`] and [`CanonicalBytes::from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(String);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::SerializationFailed`] if the value cannot be
    /// represented as JSON (e.g. a map with non-string keys), and
    /// [`EncodingError::DepthExceeded`] if it nests deeper than
    /// [`MAX_CANONICAL_DEPTH`].
    pub fn new(obj: &impl Serialize) -> Result<Self, EncodingError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(&value)
    }

    /// Canonicalize an already-built JSON value.
    pub fn from_value(value: &Value) -> Result<Self, EncodingError> {
        check_depth(value, 0)?;
        let s = serde_jcs::to_string(value)?;
        Ok(Self(s))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The canonical form as text. JCS output is always UTF-8.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner byte vector.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

/// Canonicalize a value straight to bytes.
pub fn canonicalize(obj: &impl Serialize) -> Result<Vec<u8>, EncodingError> {
    CanonicalBytes::new(obj).map(CanonicalBytes::into_bytes)
}

fn check_depth(value: &Value, depth: usize) -> Result<(), EncodingError> {
    match value {
        Value::Array(items) => {
            let depth = enter(depth)?;
            items.iter().try_for_each(|v| check_depth(v, depth))
        }
        Value::Object(map) => {
            let depth = enter(depth)?;
            map.values().try_for_each(|v| check_depth(v, depth))
        }
        _ => Ok(()),
    }
}

fn enter(depth: usize) -> Result<usize, EncodingError> {
    let next = depth + 1;
    if next > MAX_CANONICAL_DEPTH {
        return Err(EncodingError::DepthExceeded {
            limit: MAX_CANONICAL_DEPTH,
        });
    }
    Ok(next)
}
