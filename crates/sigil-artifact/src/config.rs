//! # Configuration
//!
//! YAML-backed settings for hosts of the protocol. Every section and field
//! has a default, so an empty document is a valid configuration.
//!
//! ```yaml
//! export:
//!   default_png_size: 1400
//!   raster_timeout_ms: 15000
//!   include_manifest: true
//!   packaging: zip
//! cache:
//!   max_entries: 64
//!   ttl_secs: 600
//!   side_store_dir: .sigil-cache
//! proof:
//!   api: /api/proof/sigil
//!   explorer_base: /keystream/hash/
//! commitment:
//!   key_file: commitment.key
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sigil_core::SigilError;
use sigil_zkp::HintDefaults;

use crate::bundle::Packaging;
use crate::raster::{clamp_png_size, DEFAULT_PNG_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SigilConfig {
    pub export: ExportConfig,
    pub cache: CacheConfig,
    pub proof: HintDefaults,
    pub commitment: CommitmentConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub default_png_size: u32,
    pub raster_timeout_ms: u64,
    pub include_manifest: bool,
    pub packaging: Packaging,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_png_size: DEFAULT_PNG_SIZE,
            raster_timeout_ms: 15_000,
            include_manifest: true,
            packaging: Packaging::Zip,
        }
    }
}

impl ExportConfig {
    pub fn raster_timeout(&self) -> Duration {
        Duration::from_millis(self.raster_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: usize,
    pub ttl_secs: u64,
    pub side_store_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 64,
            ttl_secs: 600,
            side_store_dir: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitmentConfig {
    /// File holding a 32-byte commitment key in hex. Unset means a fresh
    /// random key per process.
    pub key_file: Option<PathBuf>,
}

impl SigilConfig {
    pub fn load(path: &Path) -> Result<Self, SigilError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| SigilError::Config(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::from_yaml_str(&text)?;
        config.resolve_paths(path.parent().unwrap_or_else(|| Path::new(".")));
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SigilError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text).map_err(|e| SigilError::Config(e.to_string()))?
        };
        config.validated()
    }

    /// Clamp out-of-range values and reject unusable ones.
    pub fn validated(mut self) -> Result<Self, SigilError> {
        let clamped = clamp_png_size(self.export.default_png_size);
        if clamped != self.export.default_png_size {
            tracing::warn!(
                requested = self.export.default_png_size,
                clamped,
                "default_png_size out of range"
            );
            self.export.default_png_size = clamped;
        }
        if self.cache.max_entries == 0 {
            return Err(SigilError::Config("cache.max_entries must be at least 1".into()));
        }
        if self.export.raster_timeout_ms == 0 {
            return Err(SigilError::Config("export.raster_timeout_ms must be positive".into()));
        }
        Ok(self)
    }

    /// Relative paths in a config file are relative to that file.
    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.cache.side_store_dir, &mut self.commitment.key_file]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
