//! # Scan Subcommand
//!
//! ```bash
//! sigil scan artifact.svg --verify
//! sigil scan upload.bin --declared image/svg+xml
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use crate::context::SigilContext;

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// File to inspect.
    pub file: PathBuf,

    /// Declared MIME type or extension. Defaults to the file extension.
    #[arg(long)]
    pub declared: Option<String>,

    /// Verify an embedded proof.
    #[arg(long)]
    pub verify: bool,
}

pub async fn run_scan(args: &ScanArgs, ctx: &SigilContext) -> Result<Value> {
    let bytes = ctx.loader().load_bytes(&args.file).await?;
    let declared = args.declared.clone().or_else(|| {
        args.file
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string)
    });

    let outcome = ctx
        .scanner(args.verify)
        .run(&bytes, declared.as_deref())
        .await
        .into_result()
        .map_err(anyhow::Error::msg)?;
    Ok(serde_json::to_value(outcome)?)
}
