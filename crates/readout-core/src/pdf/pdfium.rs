//! Full page rasterization through libpdfium.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

use super::{scaled_dimensions, PageRenderer, Result};
use crate::error::PdfError;

/// Page renderer backed by pdfium-render.
///
/// The library is bound on first use and kept for the renderer's lifetime.
pub struct PdfiumRenderer {
    library_dir: Option<PathBuf>,
    pdfium: Option<Pdfium>,
}

// SAFETY: libpdfium has no thread affinity, it only forbids concurrent
// calls. The renderer is only reachable through `&mut self`, and the
// pipeline keeps it behind its render/OCR mutex, so calls never overlap.
unsafe impl Send for PdfiumRenderer {}

impl PdfiumRenderer {
    /// Create a renderer that looks for libpdfium in `library_dir` first,
    /// then in the working directory, then in the system library paths.
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self {
            library_dir,
            pdfium: None,
        }
    }

    fn bind(library_dir: Option<&Path>) -> Result<Pdfium> {
        let local = || Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"));

        let bindings = match library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
                .or_else(|_| local()),
            None => local(),
        }
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| PdfError::LibraryUnavailable(format!("{:?}", e)))?;

        info!("Bound libpdfium");
        Ok(Pdfium::new(bindings))
    }

    fn pdfium(&mut self) -> Result<&Pdfium> {
        if self.pdfium.is_none() {
            self.pdfium = Some(Self::bind(self.library_dir.as_deref())?);
        }
        self.pdfium
            .as_ref()
            .ok_or_else(|| PdfError::LibraryUnavailable("libpdfium not bound".to_string()))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_first_page(&mut self, path: &Path, scale: f32) -> Result<DynamicImage> {
        // Surface missing/unreadable files as I/O errors rather than pdfium codes
        std::fs::metadata(path)?;

        let pdfium = self.pdfium()?;
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| PdfError::Parse(format!("{:?}", e)))?;

        let pages = document.pages();
        debug!("Loaded PDF with {} pages", pages.len());
        if pages.len() == 0 {
            return Err(PdfError::NoPages);
        }

        let page = pages
            .get(0)
            .map_err(|e| PdfError::Render(format!("{:?}", e)))?;

        // Refuse oversized pages before pdfium allocates the bitmap
        scaled_dimensions((page.width().value, page.height().value), scale)?;

        let config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| PdfError::Render(format!("{:?}", e)))?;
        let image = bitmap.as_image();

        if image.width() == 0 || image.height() == 0 {
            return Err(PdfError::Render("rendered page has zero dimensions".to_string()));
        }

        debug!(
            "Rendered page 1 ({}x{} pt) at scale {} -> {}x{}",
            page.width().value,
            page.height().value,
            scale,
            image.width(),
            image.height()
        );

        Ok(image)
    }

    fn name(&self) -> &'static str {
        "pdfium"
    }
}
