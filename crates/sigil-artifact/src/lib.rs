//! # sigil-artifact — Self-Verifying SVG Artifacts
//!
//! The domain layer of the sigil protocol: the payload model, the
//! `<metadata>` codec, the kind classifier, proof sealing, the export
//! pipeline with its manifest and bundle, and the scanner.
//!
//! ## Flow
//!
//! ```text
//! mint ──▶ SVG with pinned payload hash
//!            │
//! export ────┴─▶ seal (commit + prove once) ─▶ PNG ─▶ manifest ─▶ bundle
//!
//! scan ──▶ parse <svg> ─▶ extract payload ─▶ classify ─▶ integrity report
//! ```
//!
//! ## Byte preservation
//!
//! Documents are never re-serialized from a tree. Every write splices text
//! at spans found by [`markup`], so markup outside the rewritten range is
//! byte-identical.
//!
//! ## Crate Policy
//!
//! - Orchestrating calls (`ExportPipeline::run`, `Scanner::run`) return
//!   [`sigil_core::Outcome`].
//! - The embedded payload is authoritative; root `data-*` attributes are a
//!   cache refreshed at mint.

pub mod bundle;
pub mod cache;
pub mod claim;
pub mod classify;
pub mod codec;
pub mod config;
pub mod export;
pub mod manifest;
pub mod markup;
pub mod mint;
pub mod payload;
pub mod raster;
pub mod scan;
pub mod seal;
pub mod source;
pub mod svg;
pub mod typed;

pub use bundle::{BundleFile, ExportBundle, Packaging};
pub use cache::{FsSideStore, SideStore, SvgCache};
pub use claim::derive_claim;
pub use classify::{classify, mirrored_attributes, Classification, FIELD_RULES};
pub use codec::{embed, extract, Wrapping};
pub use config::SigilConfig;
pub use export::{ExportPipeline, ExportRequest, ExportSummary, ExportedArtifact};
pub use manifest::{Manifest, PulseData};
pub use mint::{mint, MintedSvg};
pub use payload::{PayloadError, PayloadVersion, SigilKind, SigilPayload};
pub use raster::{Rasterizer, ResvgRasterizer};
pub use scan::{FileFormat, IntegrityReport, ScanOutcome, ScanReport, Scanner};
pub use seal::{SealReport, SealStatus, SealedSvg, SigilSealer};
pub use source::SourceLoader;
pub use svg::SvgRoot;
pub use typed::TypedPayload;
