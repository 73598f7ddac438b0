//! # Export Pipeline
//!
//! ```text
//! seal proof ─▶ rasterize PNG ─▶ manifest (optional) ─▶ package
//! ```
//!
//! Each step depends on the previous one succeeding. Everything is computed
//! in memory and the bundle is only assembled at the end, so a failed
//! export never leaves a partial download behind. Failures come back as a
//! tagged [`Outcome`] carrying a readable reason.
//!
//! Exports of the same artifact must be serialized by the caller; see
//! [`crate::seal`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sigil_core::{Outcome, PulseCalendar, SigilError};

use crate::bundle::{BundleFile, ExportBundle, Packaging};
use crate::manifest::{Manifest, PulseData, MANIFEST_FILE_NAME};
use crate::payload::SigilPayload;
use crate::raster::{clamp_png_size, Rasterizer, DEFAULT_PNG_SIZE};
use crate::seal::{SealReport, SigilSealer};

/// Caller options for one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Square PNG edge; clamped into the supported range.
    pub size: u32,
    pub include_manifest: bool,
    pub packaging: Packaging,
    /// Defaults to `sigil-<kind>-<payload hash prefix>`.
    pub filename_base: Option<String>,
    /// Defaults to the calendar's current pulse.
    pub export_pulse: Option<u64>,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            size: DEFAULT_PNG_SIZE,
            include_manifest: true,
            packaging: Packaging::Zip,
            filename_base: None,
            export_pulse: None,
        }
    }
}

/// Everything one export produced.
#[derive(Debug, Clone)]
pub struct ExportedArtifact {
    pub filename_base: String,
    pub svg: String,
    pub png: Vec<u8>,
    pub payload: SigilPayload,
    pub manifest: Option<Manifest>,
    pub seal: SealReport,
    pub bundle: ExportBundle,
}

/// Host-facing description of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub filename_base: String,
    pub files: Vec<String>,
    pub png_size: u32,
    pub seal: SealReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_hash: Option<String>,
}

impl ExportedArtifact {
    pub fn summary(&self, png_size: u32) -> ExportSummary {
        ExportSummary {
            filename_base: self.filename_base.clone(),
            files: self.bundle.files().iter().map(|f| f.name.clone()).collect(),
            png_size,
            seal: self.seal.clone(),
            manifest_hash: self.manifest.as_ref().map(|m| m.manifest_hash.clone()),
        }
    }
}

/// Orchestrates sealing, rasterization, manifest and packaging.
#[derive(Clone)]
pub struct ExportPipeline {
    sealer: SigilSealer,
    rasterizer: Arc<dyn Rasterizer>,
    calendar: Arc<dyn PulseCalendar>,
}

impl std::fmt::Debug for ExportPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportPipeline")
            .field("sealer", &self.sealer)
            .finish_non_exhaustive()
    }
}

impl ExportPipeline {
    pub fn new(
        sealer: SigilSealer,
        rasterizer: Arc<dyn Rasterizer>,
        calendar: Arc<dyn PulseCalendar>,
    ) -> Self {
        Self {
            sealer,
            rasterizer,
            calendar,
        }
    }

    pub fn sealer(&self) -> &SigilSealer {
        &self.sealer
    }

    /// Run an export, reporting failure as a tagged outcome.
    pub async fn run(&self, svg: &str, request: &ExportRequest) -> Outcome<ExportedArtifact> {
        match self.export(svg, request).await {
            Ok(artifact) => {
                tracing::info!(
                    filename_base = %artifact.filename_base,
                    payload_hash = %artifact.seal.payload_hash,
                    status = ?artifact.seal.status,
                    files = artifact.bundle.files().len(),
                    "export complete"
                );
                Outcome::Ok(artifact)
            }
            Err(e) => {
                tracing::debug!(error = %e, "export failed");
                Outcome::failed(e)
            }
        }
    }

    /// The fallible pipeline behind [`ExportPipeline::run`].
    pub async fn export(&self, svg: &str, request: &ExportRequest) -> Result<ExportedArtifact, SigilError> {
        let sealed = self.sealer.seal_svg(svg).await?;
        tracing::debug!(status = ?sealed.report.status, "proof ensured");

        let size = clamp_png_size(request.size);
        let png = self.rasterizer.rasterize(&sealed.svg, size).await?;
        tracing::debug!(size, bytes = png.len(), "rasterized");

        let filename_base = request
            .filename_base
            .clone()
            .unwrap_or_else(|| default_filename_base(&sealed.payload, &sealed.report.payload_hash));

        let manifest = if request.include_manifest {
            let pulse_data =
                PulseData::from_payload(&sealed.payload, self.calendar.as_ref(), request.export_pulse);
            Some(Manifest::build(
                &filename_base,
                &sealed.payload,
                &sealed.svg,
                &png,
                pulse_data,
            )?)
        } else {
            None
        };

        let mut members = vec![
            BundleFile {
                name: format!("{filename_base}.svg"),
                bytes: sealed.svg.as_bytes().to_vec(),
            },
            BundleFile {
                name: format!("{filename_base}.png"),
                bytes: png.clone(),
            },
        ];
        if let Some(m) = &manifest {
            members.push(BundleFile {
                name: MANIFEST_FILE_NAME.to_string(),
                bytes: m.to_pretty_json()?.into_bytes(),
            });
        }
        let bundle = ExportBundle::package(&filename_base, members, request.packaging)?;

        Ok(ExportedArtifact {
            filename_base,
            svg: sealed.svg,
            png,
            payload: sealed.payload,
            manifest,
            seal: sealed.report,
            bundle,
        })
    }
}

fn default_filename_base(payload: &SigilPayload, payload_hash: &str) -> String {
    let prefix: String = payload_hash.chars().take(12).collect();
    format!("sigil-{}-{prefix}", payload.kind())
}
