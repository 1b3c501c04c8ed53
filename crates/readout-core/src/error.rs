//! Error types for the readout-core library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening the PDF and rendering its first page.
    Render,
    /// Cutting the configured region out of the page image.
    Crop,
    /// Running OCR over the cropped region.
    Recognize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Render => "render",
            Stage::Crop => "crop",
            Stage::Recognize => "recognize",
        };
        f.write_str(name)
    }
}

/// Main error type for the readout library.
#[derive(Error, Debug)]
pub enum ReadoutError {
    /// The document could not be opened or rendered.
    #[error("[render] cannot open {}: {source}", .path.display())]
    DocumentOpen {
        path: PathBuf,
        #[source]
        source: PdfError,
    },

    /// The crop rectangle does not fit the rendered page.
    #[error("[crop] layout mismatch in {}: {source}", .path.display())]
    RegionOutOfBounds {
        path: PathBuf,
        #[source]
        source: RegionError,
    },

    /// The OCR engine failed on the cropped region.
    #[error("[recognize] OCR failed for {}: {source}", .path.display())]
    Recognition {
        path: PathBuf,
        #[source]
        source: OcrError,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A batch worker panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),
}

impl ReadoutError {
    /// Stage the error was raised in, if it came from the pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ReadoutError::DocumentOpen { .. } => Some(Stage::Render),
            ReadoutError::RegionOutOfBounds { .. } => Some(Stage::Crop),
            ReadoutError::Recognition { .. } => Some(Stage::Recognize),
            _ => None,
        }
    }

    /// Path of the document being processed, if known.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ReadoutError::DocumentOpen { path, .. }
            | ReadoutError::RegionOutOfBounds { path, .. }
            | ReadoutError::Recognition { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether retrying the same document could succeed.
    ///
    /// Only an OCR engine that started and then failed qualifies. A missing
    /// engine, decoding and layout failures are deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReadoutError::Recognition {
                source: OcrError::Engine(_),
                ..
            }
        )
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to read the file from disk.
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// The first page carries no image the embedded renderer can decode.
    #[error("no decodable page image: {0}")]
    NoImage(String),

    /// Rendering the page failed.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The PDF rendering library could not be loaded.
    #[error("PDF rendering library unavailable: {0}")]
    LibraryUnavailable(String),
}

/// Errors related to cutting the reading region out of a page.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegionError {
    /// Rectangle extends past the page image.
    #[error(
        "region ({left}, {top}, {width}x{height}) exceeds page image {image_width}x{image_height}"
    )]
    OutOfBounds {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// Rectangle has no area.
    #[error("region has zero width or height")]
    Empty,
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR engine could not be started.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// The OCR engine ran but reported a failure.
    #[error("OCR engine failed: {0}")]
    Engine(String),

    /// Failed to hand the image over to the engine.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),
}

/// Result type for the readout library.
pub type Result<T> = std::result::Result<T, ReadoutError>;
