//! SVG → PNG rasterization.
//!
//! Output is always a square PNG. The drawing is scaled to fit and centred
//! on a transparent canvas. Rendering runs on a blocking task with a hard
//! timeout; a panic inside the renderer surfaces as a rasterization error.

use std::time::Duration;

use async_trait::async_trait;
use resvg::{tiny_skia, usvg};

use sigil_core::SigilError;

use crate::svg::ensure_xmlns;

pub const MIN_PNG_SIZE: u32 = 256;
pub const MAX_PNG_SIZE: u32 = 4096;
pub const DEFAULT_PNG_SIZE: u32 = 1024;
pub const DEFAULT_RASTER_TIMEOUT: Duration = Duration::from_secs(15);

/// Clamp a requested edge length into `[MIN_PNG_SIZE, MAX_PNG_SIZE]`.
pub fn clamp_png_size(size: u32) -> u32 {
    size.clamp(MIN_PNG_SIZE, MAX_PNG_SIZE)
}

/// Renders SVG text to square PNG bytes.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// `size` is clamped before rendering.
    async fn rasterize(&self, svg: &str, size: u32) -> Result<Vec<u8>, SigilError>;
}

#[derive(Debug, Clone)]
pub struct ResvgRasterizer {
    timeout: Duration,
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_RASTER_TIMEOUT,
        }
    }
}

impl ResvgRasterizer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn render(svg: &str, size: u32) -> Result<Vec<u8>, SigilError> {
        let text = ensure_xmlns(svg);
        let tree = usvg::Tree::from_str(&text, &usvg::Options::default())
            .map_err(|e| SigilError::Rasterization(format!("could not decode SVG: {e}")))?;

        let mut pixmap = tiny_skia::Pixmap::new(size, size)
            .ok_or_else(|| SigilError::Rasterization(format!("cannot allocate {size}x{size} canvas")))?;

        let natural = tree.size();
        let (w, h) = (natural.width(), natural.height());
        if w <= 0.0 || h <= 0.0 {
            return Err(SigilError::Rasterization("SVG has an empty viewport".into()));
        }
        let edge = size as f32;
        let scale = (edge / w).min(edge / h);
        let transform = tiny_skia::Transform::from_row(
            scale,
            0.0,
            0.0,
            scale,
            (edge - w * scale) / 2.0,
            (edge - h * scale) / 2.0,
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| SigilError::Rasterization(format!("PNG encoding failed: {e}")))
    }
}

#[async_trait]
impl Rasterizer for ResvgRasterizer {
    async fn rasterize(&self, svg: &str, size: u32) -> Result<Vec<u8>, SigilError> {
        let size = clamp_png_size(size);
        let owned = svg.to_string();
        let task = tokio::task::spawn_blocking(move || Self::render(&owned, size));
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(SigilError::Rasterization(format!("renderer aborted: {join}"))),
            Err(_) => Err(SigilError::Rasterization(format!(
                "timed out after {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
