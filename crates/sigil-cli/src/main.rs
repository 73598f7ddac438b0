//! # sigil CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! Every handler result is printed as one `{ok, value | error}` document.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sigil_cli::claim::{run_claim, ClaimArgs};
use sigil_cli::digest::{run_digest, DigestArgs};
use sigil_cli::export::{run_export, ExportArgs};
use sigil_cli::mint::{run_mint, MintArgs};
use sigil_cli::scan::{run_scan, ScanArgs};
use sigil_cli::{emit, SigilContext};

/// Sigil artifact toolchain.
///
/// Mints payloads into SVG artifacts, seals them with a zero-knowledge
/// proof, exports PNG and manifest bundles, and scans artifacts back.
#[derive(Parser, Debug)]
#[command(name = "sigil", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Embed a payload into an SVG template.
    Mint(MintArgs),

    /// Seal, rasterize and package an artifact.
    Export(ExportArgs),

    /// Inspect an artifact and check its integrity data.
    Scan(ScanArgs),

    /// Canonical form and SHA-256 of a JSON document.
    Digest(DigestArgs),

    /// Derive a claim from a position and its market resolution.
    Claim(ClaimArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "sigil CLI starting");

    let ctx = match SigilContext::load(cli.config.as_deref()) {
        Ok(ctx) => ctx,
        Err(e) => return ExitCode::from(emit(Err(e))),
    };

    let result = match &cli.command {
        Commands::Mint(args) => run_mint(args, &ctx).await,
        Commands::Export(args) => run_export(args, &ctx).await,
        Commands::Scan(args) => run_scan(args, &ctx).await,
        Commands::Digest(args) => run_digest(args),
        Commands::Claim(args) => run_claim(args, &ctx).await,
    };
    ExitCode::from(emit(result))
}
