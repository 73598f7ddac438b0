//! # sigil-cli — Command-Line Host for the Sigil Protocol
//!
//! ## Subcommands
//!
//! - `mint` — embed a payload into an SVG template
//! - `export` — seal, rasterize and package an artifact
//! - `scan` — inspect an artifact and its integrity data
//! - `digest` — canonical bytes and SHA-256 of a JSON document
//! - `claim` — derive and mint a claim from a position and a resolution
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers delegate to the domain
//!   crates.
//! - Every command prints one tagged outcome document on stdout and exits
//!   0 on success, 1 on failure. Logs go to stderr.

pub mod claim;
pub mod context;
pub mod digest;
pub mod export;
pub mod mint;
pub mod scan;

use serde_json::{json, Value};

pub use context::SigilContext;

/// Render a handler result as the outcome document and exit code.
pub fn render(result: anyhow::Result<Value>) -> (Value, u8) {
    match result {
        Ok(value) => (json!({"ok": true, "value": value}), 0),
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            (json!({"ok": false, "error": format!("{e:#}")}), 1)
        }
    }
}

/// Print a handler result to stdout and return the exit code.
pub fn emit(result: anyhow::Result<Value>) -> u8 {
    let (doc, code) = render(result);
    match serde_json::to_string_pretty(&doc) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("failed to render output: {e}");
            return 1;
        }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_success_and_failure() {
        let (doc, code) = render(Ok(json!({"x": 1})));
        assert_eq!(code, 0);
        assert_eq!(doc, json!({"ok": true, "value": {"x": 1}}));

        let (doc, code) = render(Err(anyhow::anyhow!("Not a valid SVG file")));
        assert_eq!(code, 1);
        assert_eq!(doc, json!({"ok": false, "error": "Not a valid SVG file"}));
    }
}
