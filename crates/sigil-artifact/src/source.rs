//! Loads SVG documents by path through an [`SvgCache`].
//!
//! File entries are keyed by canonical path plus the file's modification
//! time and length, so a rewritten file never resolves to the old text.

use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use sigil_core::SigilError;

use crate::cache::SvgCache;

#[derive(Debug, Clone)]
pub struct SourceLoader {
    cache: Arc<SvgCache>,
}

impl SourceLoader {
    pub fn new(cache: Arc<SvgCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &SvgCache {
        &self.cache
    }

    /// Read `path` as UTF-8 text, from the cache when possible.
    pub async fn load(&self, path: &Path) -> Result<Arc<str>, SigilError> {
        let key = cache_key(path).await;
        if let Some(text) = self.cache.get(&key) {
            tracing::debug!(path = %path.display(), "svg source cache hit");
            return Ok(text);
        }
        let text = tokio::fs::read_to_string(path).await?;
        Ok(self.cache.insert(&key, &text))
    }

    /// Read raw bytes for scanning. Binary input bypasses the cache.
    pub async fn load_bytes(&self, path: &Path) -> Result<Vec<u8>, SigilError> {
        Ok(tokio::fs::read(path).await?)
    }
}

async fn cache_key(path: &Path) -> String {
    let resolved = tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf());
    let version = match tokio::fs::metadata(&resolved).await {
        Ok(meta) => {
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_nanos());
            format!("{modified}-{}", meta.len())
        }
        Err(_) => "missing".to_owned(),
    };
    format!("file://{}?v={version}", resolved.display())
}
