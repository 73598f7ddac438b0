//! # Mint Subcommand
//!
//! ```bash
//! sigil mint --template blank.svg --payload position.json --out position.svg
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use sigil_artifact::{mint, SigilPayload, TypedPayload};

use crate::context::SigilContext;

#[derive(Args, Debug)]
pub struct MintArgs {
    /// SVG template to embed into.
    #[arg(long)]
    pub template: PathBuf,

    /// JSON payload file.
    #[arg(long)]
    pub payload: PathBuf,

    /// Where to write the minted SVG.
    #[arg(long)]
    pub out: PathBuf,
}

pub async fn run_mint(args: &MintArgs, ctx: &SigilContext) -> Result<Value> {
    let template = ctx.loader().load(&args.template).await?;
    let payload = read_payload(&args.payload)?;
    TypedPayload::from_payload(&payload)
        .with_context(|| format!("{} does not match its schema", args.payload.display()))?;

    let minted = mint(&template, payload)?;
    write_text(&args.out, &minted.svg)?;
    tracing::info!(out = %args.out.display(), payload_hash = %minted.payload_hash, "minted");

    Ok(json!({
        "out": args.out.display().to_string(),
        "kind": minted.payload.kind(),
        "v": minted.payload.discriminator(),
        "payloadHash": minted.payload_hash,
    }))
}

pub(crate) fn read_payload(path: &Path) -> Result<SigilPayload> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload {}", path.display()))?;
    SigilPayload::from_json_str(&text)
        .with_context(|| format!("failed to parse payload {}", path.display()))
}

pub(crate) fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_artifact::SigilConfig;

    #[tokio::test]
    async fn mint_writes_svg_and_reports_hash() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("t.svg");
        let payload = dir.path().join("p.json");
        let out = dir.path().join("out/pos.svg");
        std::fs::write(&template, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();
        std::fs::write(
            &payload,
            r#"{"v":"SM-POS-1","marketId":"m1","side":"YES","stakeMicro":"1000000"}"#,
        )
        .unwrap();

        let ctx = SigilContext::new(SigilConfig::default()).unwrap();
        let args = MintArgs {
            template,
            payload,
            out: out.clone(),
        };
        let value = run_mint(&args, &ctx).await.unwrap();
        assert_eq!(value["kind"], "position");
        assert_eq!(value["payloadHash"].as_str().unwrap().len(), 64);
        assert!(std::fs::read_to_string(out).unwrap().contains("data-market-id=\"m1\""));
    }

    #[tokio::test]
    async fn schema_violation_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("t.svg");
        let payload = dir.path().join("p.json");
        std::fs::write(&template, "<svg/>").unwrap();
        std::fs::write(&payload, r#"{"v":"SM-POS-1","marketId":"m1"}"#).unwrap();

        let ctx = SigilContext::new(SigilConfig::default()).unwrap();
        let args = MintArgs {
            template,
            payload,
            out: dir.path().join("o.svg"),
        };
        let err = run_mint(&args, &ctx).await.unwrap_err();
        assert!(format!("{err:#}").contains("does not match its schema"));
    }
}
