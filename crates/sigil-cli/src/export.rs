//! # Export Subcommand
//!
//! Seal, rasterize and package one artifact into `--out-dir`.
//!
//! ```bash
//! sigil export position.svg --out-dir ./out --size 2048 --separate
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use sigil_artifact::{ExportRequest, Packaging};

use crate::context::SigilContext;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Minted SVG artifact.
    pub input: PathBuf,

    /// Directory receiving the bundle.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// PNG edge in pixels. Defaults to the configured size.
    #[arg(long)]
    pub size: Option<u32>,

    /// Skip the manifest.
    #[arg(long)]
    pub no_manifest: bool,

    /// Write separate files instead of one zip archive.
    #[arg(long)]
    pub separate: bool,

    /// Base name of the exported files.
    #[arg(long)]
    pub filename_base: Option<String>,

    /// Pulse recorded as the export moment.
    #[arg(long)]
    pub export_pulse: Option<u64>,
}

impl ExportArgs {
    fn request(&self, ctx: &SigilContext) -> ExportRequest {
        let export = &ctx.config().export;
        let packaging = if self.separate {
            Packaging::Separate
        } else {
            export.packaging
        };
        ExportRequest {
            size: self.size.unwrap_or(export.default_png_size),
            include_manifest: export.include_manifest && !self.no_manifest,
            packaging,
            filename_base: self.filename_base.clone(),
            export_pulse: self.export_pulse,
        }
    }
}

pub async fn run_export(args: &ExportArgs, ctx: &SigilContext) -> Result<Value> {
    let svg = ctx.loader().load(&args.input).await?;
    let request = args.request(ctx);

    let artifact = ctx
        .pipeline()
        .run(&svg, &request)
        .await
        .into_result()
        .map_err(anyhow::Error::msg)?;

    let written = artifact
        .bundle
        .write_to(&args.out_dir)
        .with_context(|| format!("failed to write bundle to {}", args.out_dir.display()))?;

    let summary = artifact.summary(sigil_artifact::raster::clamp_png_size(request.size));
    let mut value = serde_json::to_value(&summary)?;
    value["written"] = json!(written
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>());
    Ok(value)
}
