//! # Claim Subcommand
//!
//! Derive a claim from a minted position and the resolution of its market,
//! then mint it into a template.
//!
//! ```bash
//! sigil claim --position pos.svg --resolution res.svg --template claim.svg --out out.svg
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::Args;
use serde_json::{json, Value};

use sigil_artifact::{codec, derive_claim, mint, SigilPayload};
use sigil_core::{KaiCalendar, PulseCalendar};

use crate::context::SigilContext;
use crate::mint::write_text;

#[derive(Args, Debug)]
pub struct ClaimArgs {
    /// Minted position artifact.
    #[arg(long)]
    pub position: PathBuf,

    /// Minted resolution artifact.
    #[arg(long)]
    pub resolution: PathBuf,

    /// SVG template for the claim.
    #[arg(long)]
    pub template: PathBuf,

    /// Where to write the claim SVG.
    #[arg(long)]
    pub out: PathBuf,

    /// Claim pulse. Defaults to the current pulse.
    #[arg(long)]
    pub claim_pulse: Option<u64>,

    /// Payout in micro-units, recorded only for a winning claim.
    #[arg(long)]
    pub payout_micro: Option<String>,
}

pub async fn run_claim(args: &ClaimArgs, ctx: &SigilContext) -> Result<Value> {
    let position = load_payload(ctx, &args.position).await?;
    let resolution = load_payload(ctx, &args.resolution).await?;
    let template = ctx.loader().load(&args.template).await?;

    let pulse = args.claim_pulse.unwrap_or_else(|| KaiCalendar.now_pulse());
    let claim = derive_claim(&position, &resolution, pulse, args.payout_micro.clone())?;
    let minted = mint(&template, claim)?;
    write_text(&args.out, &minted.svg)?;

    let body = minted.payload.body();
    Ok(json!({
        "out": args.out.display().to_string(),
        "claimId": body.get("claimId"),
        "won": body.get("won"),
        "payloadHash": minted.payload_hash,
    }))
}

async fn load_payload(ctx: &SigilContext, path: &Path) -> Result<SigilPayload> {
    let svg = ctx.loader().load(path).await?;
    codec::extract(&svg).ok_or_else(|| anyhow!("{} carries no sigil payload", path.display()))
}
