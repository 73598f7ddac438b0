//! # Export Manifest
//!
//! An audit record written next to an exported SVG/PNG pair. It is never
//! read back by the protocol.
//!
//! `manifestHash` is `SHA-256(canonical(manifest − manifestHash))`. Every
//! other hash is recomputed from the bytes being exported; only the
//! payload's own pinned `integrity.payloadHash` is taken as given.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sigil_core::{artifact_hash, sha256_hex, CanonicalBytes, PulseCalendar, PulseMoment, SigilError};

use crate::payload::SigilPayload;

pub const MANIFEST_VERSION: u32 = 1;
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

const OPEN_PULSE_PATHS: [&str; 3] = ["openPulse", "pulse", "openedAt.pulse"];
const RESOLVE_PULSE_PATHS: [&str; 3] = ["resolvedPulse", "resolvePulse", "resolution.pulse"];

/// Calendar moments relevant to an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<PulseMoment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve: Option<PulseMoment>,
    pub export: PulseMoment,
}

impl PulseData {
    /// Decode open/resolve pulses from the payload and resolve all three
    /// through `calendar`. `export_pulse` defaults to the current pulse.
    pub fn from_payload(
        payload: &SigilPayload,
        calendar: &dyn PulseCalendar,
        export_pulse: Option<u64>,
    ) -> Self {
        Self {
            open: first_pulse(payload, &OPEN_PULSE_PATHS).map(|p| calendar.moment(p)),
            resolve: first_pulse(payload, &RESOLVE_PULSE_PATHS).map(|p| calendar.moment(p)),
            export: calendar.moment(export_pulse.unwrap_or_else(|| calendar.now_pulse())),
        }
    }
}

/// The `manifest.json` of an export bundle. Field order is the file's key
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub manifest_version: u32,
    pub filename_base: String,
    pub pulse_data: PulseData,
    pub payload_hash: String,
    pub svg_hash: String,
    pub png_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zk_poseidon_hash: Option<String>,
    pub zk_public_inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_hints: Option<Value>,
    pub sigil_payload: SigilPayload,
    pub manifest_hash: String,
}

impl Manifest {
    /// Build a manifest for the final SVG text and PNG bytes.
    pub fn build(
        filename_base: &str,
        payload: &SigilPayload,
        svg: &str,
        png: &[u8],
        pulse_data: PulseData,
    ) -> Result<Self, SigilError> {
        let mut manifest = Self {
            manifest_version: MANIFEST_VERSION,
            filename_base: filename_base.to_string(),
            pulse_data,
            payload_hash: payload.payload_hash()?,
            svg_hash: artifact_hash(svg.as_bytes()).to_hex(),
            png_hash: artifact_hash(png).to_hex(),
            zk_poseidon_hash: payload.zk_poseidon_hash().map(str::to_string),
            zk_public_inputs: payload.zk_public_inputs(),
            proof_hints: payload.proof_hints().cloned(),
            sigil_payload: payload.clone(),
            manifest_hash: String::new(),
        };
        manifest.manifest_hash = manifest.compute_hash()?;
        Ok(manifest)
    }

    /// Hash of the manifest without its `manifestHash` key.
    pub fn compute_hash(&self) -> Result<String, SigilError> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("manifestHash");
        }
        Ok(sha256_hex(&CanonicalBytes::from_value(&value)?))
    }

    pub fn verify_hash(&self) -> Result<bool, SigilError> {
        Ok(self.compute_hash()? == self.manifest_hash)
    }

    /// Pretty-printed JSON for the bundle.
    pub fn to_pretty_json(&self) -> Result<String, SigilError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn first_pulse(payload: &SigilPayload, paths: &[&str]) -> Option<u64> {
    paths.iter().find_map(|path| {
        let v = payload.lookup(path)?;
        match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sigil_core::KaiCalendar;

    fn payload() -> SigilPayload {
        SigilPayload::from_value(json!({
            "v": "SM-CLAIM-1",
            "openPulse": "1200",
            "resolution": {"pulse": 3400},
            "zkPoseidonHash": "abc",
            "zkPublicInputs": ["abc"],
            "integrity": {"payloadHash": "pinned"}
        }))
        .unwrap()
    }

    #[test]
    fn pulses_are_decoded_from_payload() {
        let data = PulseData::from_payload(&payload(), &KaiCalendar, Some(5000));
        assert_eq!(data.open.unwrap().pulse, 1200);
        assert_eq!(data.resolve.unwrap().pulse, 3400);
        assert_eq!(data.export.pulse, 5000);
    }

    #[test]
    fn missing_pulses_are_omitted() {
        let p = SigilPayload::from_value(json!({"v": "SM-PROP-1", "text": "t"})).unwrap();
        let data = PulseData::from_payload(&p, &KaiCalendar, Some(1));
        assert!(data.open.is_none() && data.resolve.is_none());
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("open").is_none());
    }

    #[test]
    fn manifest_keys_and_hash() {
        let p = payload();
        let data = PulseData::from_payload(&p, &KaiCalendar, Some(5000));
        let m = Manifest::build("sigil-claim", &p, "<svg/>", b"png", data).unwrap();
        assert_eq!(m.payload_hash, "pinned");
        assert_eq!(m.svg_hash, artifact_hash(b"<svg/>").to_hex());
        assert!(m.verify_hash().unwrap());

        let value = serde_json::to_value(&m).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        for key in [
            "manifestVersion",
            "filenameBase",
            "pulseData",
            "payloadHash",
            "svgHash",
            "pngHash",
            "zkPoseidonHash",
            "zkPublicInputs",
            "sigilPayload",
            "manifestHash",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }

    #[test]
    fn tampering_breaks_manifest_hash() {
        let p = payload();
        let data = PulseData::from_payload(&p, &KaiCalendar, Some(5000));
        let mut m = Manifest::build("x", &p, "<svg/>", b"png", data).unwrap();
        m.png_hash = artifact_hash(b"other").to_hex();
        assert!(!m.verify_hash().unwrap());
    }
}
