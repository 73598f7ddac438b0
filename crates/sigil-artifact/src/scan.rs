//! # Scanner / Verifier
//!
//! Inspects an uploaded artifact: what kind it is, its display fields, and
//! whether its integrity data is self-consistent.
//!
//! Only SVG is inspected. Other recognizable formats (compressed SVG, PNG,
//! JPEG, GIF, WebP, PDF) get [`ScanOutcome::Unsupported`]. Input declared as SVG that does not parse
//! as an `<svg>` document fails with "Not a valid SVG file". Past that
//! point a scan always succeeds: a missing or garbled payload yields kind
//! `unknown` and an empty field map.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sigil_core::{Outcome, SigilError};
use sigil_zkp::ProofGenerator;

use crate::classify::{classify, stale_attributes, Classification};
use crate::codec;
use crate::payload::{SigilKind, SigilPayload};
use crate::svg::SvgRoot;

/// File formats the scanner can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Svg,
    Svgz,
    Png,
    Jpeg,
    Gif,
    Webp,
    Pdf,
}

impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Svgz => "svgz",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Pdf => "pdf",
        }
    }

    /// Interpret a MIME type, extension (with or without a dot) or file
    /// name.
    pub fn from_declared(declared: &str) -> Option<Self> {
        let d = declared.trim().to_ascii_lowercase();
        let token = match d.split(';').next().unwrap_or_default() {
            "image/svg+xml" => "svg",
            "image/svg+xml-compressed" => "svgz",
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpeg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "application/pdf" => "pdf",
            other => other.rsplit('.').next().unwrap_or(other),
        };
        match token {
            "svg" => Some(Self::Svg),
            "svgz" => Some(Self::Svgz),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Recognize binary formats by magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF8") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if bytes.starts_with(&[0x1F, 0x8B]) {
            // Gzip streams are reported as compressed SVG.
            Some(Self::Svgz)
        } else if bytes.starts_with(b"%PDF") {
            Some(Self::Pdf)
        } else {
            None
        }
    }
}

/// A root attribute whose cached value disagrees with the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleAttribute {
    pub attribute: String,
    pub attribute_value: String,
    pub payload_value: String,
}

/// Self-consistency of an embedded payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_payload_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_payload_hash: Option<String>,
    /// `None` when no hash is declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_hash_matches: Option<bool>,
    pub has_proof: bool,
    /// Whether `zkPublicInputs[0]` equals `zkPoseidonHash`. `None` when
    /// either is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_inputs_consistent: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stale_attributes: Vec<StaleAttribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_error: Option<String>,
}

impl IntegrityReport {
    fn build(attrs: &std::collections::BTreeMap<String, String>, payload: &SigilPayload) -> Self {
        let declared = payload.declared_payload_hash().map(str::to_string);
        let computed = payload.computed_payload_hash().ok();
        let payload_hash_matches = match (&declared, &computed) {
            (Some(d), Some(c)) => Some(d.eq_ignore_ascii_case(c)),
            _ => None,
        };
        let inputs = payload.zk_public_inputs();
        let public_inputs_consistent = match (inputs.first(), payload.zk_poseidon_hash()) {
            (Some(first), Some(poseidon)) => {
                Some(first.trim().eq_ignore_ascii_case(poseidon.trim()))
            }
            _ => None,
        };
        Self {
            declared_payload_hash: declared,
            computed_payload_hash: computed,
            payload_hash_matches,
            has_proof: payload.zk_proof().is_some(),
            public_inputs_consistent,
            stale_attributes: stale_attributes(attrs, payload)
                .into_iter()
                .map(|(attribute, attribute_value, payload_value)| StaleAttribute {
                    attribute,
                    attribute_value,
                    payload_value,
                })
                .collect(),
            proof_verified: None,
            proof_error: None,
        }
    }
}

/// What a successful scan found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub kind: SigilKind,
    pub fields: std::collections::BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<IntegrityReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanOutcome {
    Inspected(ScanReport),
    Unsupported { format: String },
}

/// Artifact inspector, optionally able to verify proofs.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    verifier: Option<ProofGenerator>,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify embedded proofs through `generator`'s proof system.
    pub fn with_verifier(mut self, generator: ProofGenerator) -> Self {
        self.verifier = Some(generator);
        self
    }

    pub async fn run(&self, bytes: &[u8], declared: Option<&str>) -> Outcome<ScanOutcome> {
        self.scan(bytes, declared).await.into()
    }

    pub async fn scan(&self, bytes: &[u8], declared: Option<&str>) -> Result<ScanOutcome, SigilError> {
        let declared_format = declared.and_then(FileFormat::from_declared);
        match declared_format.or_else(|| FileFormat::sniff(bytes)) {
            Some(format) if format != FileFormat::Svg => {
                tracing::debug!(format = format.as_str(), "unsupported scan input");
                return Ok(ScanOutcome::Unsupported {
                    format: format.as_str().to_string(),
                });
            }
            _ => {}
        }

        let text = std::str::from_utf8(bytes).map_err(|_| SigilError::not_an_svg())?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let root = SvgRoot::parse(text)?;
        let payload = codec::extract(text);
        let Classification { kind, fields } = classify(&root.attributes, payload.as_ref());

        let integrity = match &payload {
            Some(p) => {
                let mut report = IntegrityReport::build(&root.attributes, p);
                if let (Some(verifier), Some(proof)) = (&self.verifier, p.zk_proof()) {
                    match verifier.verify(proof, &p.zk_public_inputs()).await {
                        Ok(ok) => report.proof_verified = Some(ok),
                        Err(e) => report.proof_error = Some(e.to_string()),
                    }
                }
                Some(report)
            }
            None => None,
        };
        tracing::debug!(kind = %kind, fields = fields.len(), "scanned artifact");

        Ok(ScanOutcome::Inspected(ScanReport {
            kind,
            fields,
            payload: payload.map(|p| p.to_value()),
            integrity,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: Outcome<ScanOutcome>) -> ScanReport {
        match outcome.into_result().unwrap() {
            ScanOutcome::Inspected(r) => r,
            other => panic!("expected a report, got {other:?}"),
        }
    }

    #[test]
    fn declared_formats() {
        assert_eq!(FileFormat::from_declared("image/svg+xml"), Some(FileFormat::Svg));
        assert_eq!(FileFormat::from_declared(".SVG"), Some(FileFormat::Svg));
        assert_eq!(FileFormat::from_declared("photo.jpg"), Some(FileFormat::Jpeg));
        assert_eq!(FileFormat::from_declared("image/png"), Some(FileFormat::Png));
        assert_eq!(FileFormat::from_declared("svgz"), Some(FileFormat::Svgz));
        assert_eq!(FileFormat::from_declared("logo.svgz"), Some(FileFormat::Svgz));
        assert_eq!(FileFormat::from_declared("image/webp"), Some(FileFormat::Webp));
        assert_eq!(FileFormat::from_declared("anim.GIF"), Some(FileFormat::Gif));
        assert_eq!(FileFormat::from_declared("text/plain"), None);
    }

    #[test]
    fn sniffed_formats() {
        assert_eq!(FileFormat::sniff(b"GIF89a\x01\0"), Some(FileFormat::Gif));
        assert_eq!(FileFormat::sniff(b"RIFF\x24\0\0\0WEBPVP8 "), Some(FileFormat::Webp));
        assert_eq!(FileFormat::sniff(b"RIFF\x24\0\0\0WAVEfmt "), None);
        assert_eq!(FileFormat::sniff(&[0x1F, 0x8B, 0x08, 0x00]), Some(FileFormat::Svgz));
        assert_eq!(FileFormat::sniff(b"<svg/>"), None);
    }

    #[tokio::test]
    async fn declared_svgz_is_unsupported_without_sniffing() {
        let outcome = Scanner::new().run(b"<svg/>", Some("svgz")).await;
        assert_eq!(
            outcome.into_result().unwrap(),
            ScanOutcome::Unsupported {
                format: "svgz".into()
            }
        );
    }

    #[tokio::test]
    async fn non_sigil_metadata_json_is_not_a_payload() {
        let svg = br#"<svg><metadata>{"title":"Logo","text":"hello","marketId":"zz"}</metadata></svg>"#;
        let r = report(Scanner::new().run(svg, Some("svg")).await);
        assert_eq!(r.kind, SigilKind::Unknown);
        assert!(r.fields.is_empty());
        assert!(r.payload.is_none());
        assert!(r.integrity.is_none());
    }

    #[tokio::test]
    async fn svg_without_payload_is_unknown() {
        let r = report(Scanner::new().run(b"<svg/>", Some("svg")).await);
        assert_eq!(r.kind, SigilKind::Unknown);
        assert!(r.fields.is_empty());
        assert!(r.integrity.is_none());
    }

    #[tokio::test]
    async fn garbled_metadata_still_scans() {
        let svg = br#"<svg data-kind="vault"><metadata>{"v": broken</metadata></svg>"#;
        let r = report(Scanner::new().run(svg, None).await);
        assert_eq!(r.kind, SigilKind::Vault);
        assert!(r.payload.is_none());
    }

    #[tokio::test]
    async fn declared_svg_that_is_not_svg_fails() {
        let outcome = Scanner::new().run(b"hello", Some("x.svg")).await;
        assert_eq!(outcome.error(), Some("Not a valid SVG file"));
        let outcome = Scanner::new().run(b"<html/>", Some("image/svg+xml")).await;
        assert_eq!(outcome.error(), Some("Not a valid SVG file"));
    }

    #[tokio::test]
    async fn binary_formats_are_unsupported() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        let outcome = Scanner::new().run(png, None).await.into_result().unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Unsupported {
                format: "png".into()
            }
        );
        let outcome = Scanner::new().run(b"%PDF-1.7", Some("application/pdf")).await;
        assert!(matches!(outcome.value(), Some(ScanOutcome::Unsupported { .. })));
    }

    #[tokio::test]
    async fn integrity_flags_tampering_and_stale_cache() {
        let svg = br#"<svg data-market-id="m2"><metadata>{"v":"SM-POS-1","marketId":"m1","integrity":{"payloadHash":"deadbeef"},"zkPoseidonHash":"aa","zkPublicInputs":["bb"]}</metadata></svg>"#;
        let r = report(Scanner::new().run(svg, Some("svg")).await);
        let integrity = r.integrity.unwrap();
        assert_eq!(integrity.payload_hash_matches, Some(false));
        assert_eq!(integrity.public_inputs_consistent, Some(false));
        assert!(!integrity.has_proof);
        assert_eq!(integrity.stale_attributes.len(), 1);
        assert_eq!(r.fields["marketId"], "m2");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(ScanOutcome::Unsupported {
            format: "pdf".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "unsupported", "format": "pdf"}));
    }
}
