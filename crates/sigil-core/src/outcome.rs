//! # Tagged Outcomes
//!
//! Protocol operations never throw across the boundary to their host.
//! [`Outcome`] is the value the host receives, serialized as
//! `{"ok": true, "value": …}` or `{"ok": false, "error": "…"}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A tagged success/failure value handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn failed(error: impl std::fmt::Display) -> Self {
        Self::Failed(error.to_string())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(v) => Some(v),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Failed(e) => Err(e),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) => Self::failed(e),
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireRef<'a, T> {
    Ok { ok: bool, value: &'a T },
    Failed { ok: bool, error: &'a str },
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ok(value) => WireRef::Ok { ok: true, value }.serialize(serializer),
            Self::Failed(error) => {
                let wire: WireRef<'_, T> = WireRef::Failed { ok: false, error };
                wire.serialize(serializer)
            }
        }
    }
}

#[derive(Deserialize)]
struct Wire<T> {
    ok: bool,
    value: Option<T>,
    error: Option<String>,
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Outcome<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::<T>::deserialize(deserializer)?;
        match (wire.ok, wire.value, wire.error) {
            (true, Some(v), _) => Ok(Self::Ok(v)),
            (false, _, Some(e)) => Ok(Self::Failed(e)),
            (true, None, _) => Err(serde::de::Error::missing_field("value")),
            (false, _, None) => Err(serde::de::Error::missing_field("error")),
        }
    }
}
