//! Per-document extraction: render, crop, OCR, then pick the reading.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::error::{ReadoutError, Result};
use crate::models::config::{ReadoutConfig, RegionConfig};
use crate::models::reading::ExtractionResult;
use crate::ocr::{create_recognizer, TextRecognizer};
use crate::pdf::{create_renderer, PageRenderer};
use crate::reading::ReadingRules;
use crate::region::crop;

/// Engines that must not be driven from two threads at once.
struct Engines {
    renderer: Box<dyn PageRenderer>,
    recognizer: Box<dyn TextRecognizer>,
}

/// Extracts the reading from one PDF at a time per call, safe to share
/// between threads.
///
/// Rendering, cropping and OCR run under a lock owned by the pipeline;
/// concurrent callers queue for it. Token rules run outside the lock.
pub struct ExtractionPipeline {
    engines: Mutex<Engines>,
    scale: f32,
    region: RegionConfig,
    snapshot: Option<PathBuf>,
    max_retries: u32,
    rules: ReadingRules,
}

impl ExtractionPipeline {
    /// Create a pipeline from explicit engines.
    pub fn new(
        config: &ReadoutConfig,
        renderer: Box<dyn PageRenderer>,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "Pipeline: renderer={}, ocr={}, scale={}, region=({}, {}, {}x{})",
            renderer.name(),
            recognizer.name(),
            config.render.scale,
            config.region.left,
            config.region.top,
            config.region.width,
            config.region.height
        );

        Ok(Self {
            engines: Mutex::new(Engines {
                renderer,
                recognizer,
            }),
            scale: config.render.scale,
            region: config.region,
            snapshot: config.render.debug_snapshot.clone(),
            max_retries: config.ocr.max_retries,
            rules: ReadingRules::from_config(&config.selection),
        })
    }

    /// Create a pipeline with the renderer and OCR engine named in the
    /// configuration.
    pub fn from_config(config: &ReadoutConfig) -> Result<Self> {
        let renderer = create_renderer(&config.render)?;
        let recognizer = create_recognizer(&config.ocr)?;
        Self::new(config, renderer, recognizer)
    }

    /// Extract the reading from the PDF at `path`.
    pub fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        let start = Instant::now();
        debug!("Processing file: {}", path.display());

        let text = self.read_region_text(path)?;
        let reading = self.rules.extract(&text);

        info!(
            "{}: reading {:?} from {} tokens in {}ms",
            path.display(),
            reading.value,
            reading.tokens.len(),
            start.elapsed().as_millis()
        );

        Ok(ExtractionResult {
            selected_number: reading.value,
            token_list: reading.tokens,
        })
    }

    /// Render, crop and OCR under the engine lock.
    fn read_region_text(&self, path: &Path) -> Result<String> {
        // A panic in another caller leaves the engines usable
        let mut engines = self.engines.lock().unwrap_or_else(PoisonError::into_inner);

        let page = engines
            .renderer
            .render_first_page(path, self.scale)
            .map_err(|source| ReadoutError::DocumentOpen {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Rendered page: {}x{}", page.width(), page.height());

        let region = crop(&page, self.region).map_err(|source| {
            error!(
                "Crop region does not fit {} - wrong scale or document type? {}",
                path.display(),
                source
            );
            ReadoutError::RegionOutOfBounds {
                path: path.to_path_buf(),
                source,
            }
        })?;
        drop(page);

        if let Some(snapshot) = &self.snapshot {
            match region.save(snapshot) {
                Ok(()) => debug!("Wrote region snapshot to {}", snapshot.display()),
                Err(e) => warn!("Could not write snapshot {}: {}", snapshot.display(), e),
            }
        }

        let mut attempt = 0;
        loop {
            let source = match engines.recognizer.recognize(&region) {
                Ok(text) => {
                    debug!("OCR text ({} chars): {:?}", text.len(), text);
                    return Ok(text);
                }
                Err(source) => source,
            };

            let err = ReadoutError::Recognition {
                path: path.to_path_buf(),
                source,
            };
            if attempt >= self.max_retries || !err.is_transient() {
                return Err(err);
            }

            attempt += 1;
            warn!(
                "Retrying OCR (attempt {}/{}): {}",
                attempt + 1,
                self.max_retries + 1,
                err
            );
        }
    }
}
