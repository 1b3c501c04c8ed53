//! First-page rendering of PDF documents.

mod embedded;
#[cfg(feature = "pdfium")]
mod pdfium;

pub use embedded::EmbeddedImageRenderer;
#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRenderer;

use std::path::Path;

use image::DynamicImage;

use crate::error::{PdfError, ReadoutError};
use crate::models::config::{RenderConfig, RendererKind};

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Turns page 1 of a PDF into a raster image.
///
/// Implementations are not required to be usable from several threads at
/// once; the pipeline serializes every call.
pub trait PageRenderer: Send {
    /// Render the first page at `scale` times its native size (72 points
    /// per inch). Later pages are never looked at.
    fn render_first_page(&mut self, path: &Path, scale: f32) -> Result<DynamicImage>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Build the renderer selected in the configuration.
pub fn create_renderer(
    config: &RenderConfig,
) -> std::result::Result<Box<dyn PageRenderer>, ReadoutError> {
    match config.renderer {
        RendererKind::Embedded => Ok(Box::new(EmbeddedImageRenderer::new())),
        #[cfg(feature = "pdfium")]
        RendererKind::Pdfium => Ok(Box::new(PdfiumRenderer::new(
            config.pdfium_library_dir.clone(),
        ))),
        #[cfg(not(feature = "pdfium"))]
        RendererKind::Pdfium => Err(ReadoutError::Config(
            "render.renderer = \"pdfium\" requires the `pdfium` feature".to_string(),
        )),
    }
}

/// Largest page image a renderer may allocate (about 480 MB as RGBA).
///
/// A letter page at scale 6 is 17.5 MP; the PDF maximum of 14400 pt square
/// would be 7.4 GP.
pub const MAX_PAGE_PIXELS: u64 = 120_000_000;

/// Pixel size of a page of `points` at `scale`, refused when it would exceed
/// [`MAX_PAGE_PIXELS`].
pub(crate) fn scaled_dimensions(points: (f32, f32), scale: f32) -> Result<(u32, u32)> {
    let width = (points.0 * scale).round();
    let height = (points.1 * scale).round();

    if !(width.is_finite() && height.is_finite()) || width < 1.0 || height < 1.0 {
        return Err(PdfError::Render(format!(
            "page {}x{} pt at scale {} has no pixels",
            points.0, points.1, scale
        )));
    }

    let pixels = f64::from(width) * f64::from(height);
    if pixels > MAX_PAGE_PIXELS as f64 {
        return Err(PdfError::Render(format!(
            "page {}x{} pt at scale {} needs {:.0}x{:.0} px, over the {} pixel limit",
            points.0, points.1, scale, width, height, MAX_PAGE_PIXELS
        )));
    }

    Ok((width as u32, height as u32))
}
