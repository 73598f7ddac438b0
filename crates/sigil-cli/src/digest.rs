//! # Digest Subcommand
//!
//! Canonicalize a JSON document and print its SHA-256. Useful for
//! checking a payload hash or manifest hash by hand.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use sigil_core::{sha256_hex, CanonicalBytes};

#[derive(Args, Debug)]
pub struct DigestArgs {
    /// JSON document.
    pub file: PathBuf,
}

pub fn run_digest(args: &DigestArgs) -> Result<Value> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not JSON", args.file.display()))?;
    let canonical = CanonicalBytes::from_value(&value).context("canonicalization failed")?;
    Ok(json!({
        "canonical": canonical.as_str(),
        "sha256": sha256_hex(&canonical),
    }))
}
