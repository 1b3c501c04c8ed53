//! Core library for reading a numeric field off scanned PDF forms.
//!
//! This crate provides:
//! - First-page rendering (libpdfium, or resampling of the embedded scan)
//! - Cropping of the fixed region holding the reading
//! - OCR of that region (tesseract, or PaddleOCR models via pure-onnx-ocr)
//! - Token rules that pick the reading out of the OCR text
//! - A thread-safe pipeline and a bounded concurrent batch driver

pub mod batch;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod reading;
pub mod region;

pub use batch::{extract_all, extract_all_with_progress, DocumentOutcome};
pub use error::{OcrError, PdfError, ReadoutError, RegionError, Result, Stage};
pub use models::config::ReadoutConfig;
pub use models::reading::{format_reading, ExtractionResult};
pub use ocr::{create_recognizer, TesseractRecognizer, TextRecognizer};
#[cfg(feature = "onnx")]
pub use ocr::OnnxRecognizer;
pub use pdf::{create_renderer, EmbeddedImageRenderer, PageRenderer};
#[cfg(feature = "pdfium")]
pub use pdf::PdfiumRenderer;
pub use pipeline::ExtractionPipeline;
pub use reading::{merge, select, tokenize, Reading, ReadingRules};
pub use region::crop;
