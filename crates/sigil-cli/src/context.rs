//! Shared services for one CLI invocation, built from configuration.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use sigil_artifact::{
    ExportPipeline, ResvgRasterizer, Scanner, SigilConfig, SigilSealer, SourceLoader, SvgCache,
};
use sigil_core::KaiCalendar;
use sigil_crypto::{CommitmentKey, Committer};
use sigil_zkp::{MockProofSystem, ProofGenerator};

#[derive(Debug, Clone)]
pub struct SigilContext {
    config: SigilConfig,
    committer: Arc<Committer>,
    loader: SourceLoader,
}

impl SigilContext {
    /// Load configuration from `path`, or use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => SigilConfig::load(p)
                .with_context(|| format!("failed to load config {}", p.display()))?,
            None => SigilConfig::default(),
        };
        Self::new(config)
    }

    pub fn new(config: SigilConfig) -> Result<Self> {
        let committer = match &config.commitment.key_file {
            Some(path) => {
                let key = CommitmentKey::load(path)
                    .with_context(|| format!("failed to load commitment key {}", path.display()))?;
                tracing::debug!(key_file = %path.display(), "using pinned commitment key");
                Committer::with_key(key)
            }
            None => Committer::random().context("failed to draw a commitment key")?,
        };
        let loader = SourceLoader::new(Arc::new(SvgCache::from_config(&config.cache)));
        Ok(Self {
            config,
            committer: Arc::new(committer),
            loader,
        })
    }

    pub fn config(&self) -> &SigilConfig {
        &self.config
    }

    pub fn loader(&self) -> &SourceLoader {
        &self.loader
    }

    pub fn generator(&self) -> ProofGenerator {
        ProofGenerator::new(Arc::new(MockProofSystem)).with_defaults(self.config.proof.clone())
    }

    pub fn sealer(&self) -> SigilSealer {
        SigilSealer::new(self.committer.clone(), self.generator())
    }

    pub fn pipeline(&self) -> ExportPipeline {
        ExportPipeline::new(
            self.sealer(),
            Arc::new(ResvgRasterizer::new(self.config.export.raster_timeout())),
            Arc::new(KaiCalendar),
        )
    }

    pub fn scanner(&self, verify: bool) -> Scanner {
        if verify {
            Scanner::new().with_verifier(self.generator())
        } else {
            Scanner::new()
        }
    }
}
