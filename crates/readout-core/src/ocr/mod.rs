//! OCR over the cropped reading field.

#[cfg(feature = "onnx")]
mod pure_engine;
mod tesseract;

#[cfg(feature = "onnx")]
pub use pure_engine::OnnxRecognizer;
pub use tesseract::TesseractRecognizer;

use image::DynamicImage;
use tracing::warn;

use crate::error::{OcrError, ReadoutError};
use crate::models::config::{OcrConfig, OcrEngineKind};

/// Runs OCR over an image and returns the raw text.
///
/// Empty or garbage text is a valid result; errors are reserved for the
/// engine itself failing. Calls are serialized by the pipeline.
pub trait TextRecognizer: Send {
    /// Recognize the text in `image`, treating it as one block of text.
    fn recognize(&mut self, image: &DynamicImage) -> Result<String, OcrError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Build the recognizer selected in the configuration.
pub fn create_recognizer(config: &OcrConfig) -> Result<Box<dyn TextRecognizer>, ReadoutError> {
    match config.engine {
        OcrEngineKind::Tesseract => {
            let recognizer = TesseractRecognizer::from_config(config);
            // Still usable for documents that fail before OCR
            if !recognizer.is_available() {
                warn!(
                    "Cannot start `{}`; every document that reaches OCR will fail",
                    config.tesseract_cmd
                );
            }
            Ok(Box::new(recognizer))
        }
        #[cfg(feature = "onnx")]
        OcrEngineKind::Onnx => {
            let recognizer = OnnxRecognizer::from_dir(&config.model_dir).map_err(|e| {
                ReadoutError::Config(format!(
                    "cannot load OCR models from {}: {}",
                    config.model_dir.display(),
                    e
                ))
            })?;
            Ok(Box::new(recognizer))
        }
        #[cfg(not(feature = "onnx"))]
        OcrEngineKind::Onnx => Err(ReadoutError::Config(
            "ocr.engine = \"onnx\" requires the `onnx` feature".to_string(),
        )),
    }
}

/// Order text boxes top-to-bottom, then left-to-right.
///
/// Boxes whose top edges fall in the same 20 px band count as one line.
#[cfg(feature = "onnx")]
pub(crate) fn reading_order(a: (f32, f32), b: (f32, f32)) -> std::cmp::Ordering {
    let row_a = (a.1 / 20.0) as i32;
    let row_b = (b.1 / 20.0) as i32;

    if row_a != row_b {
        row_a.cmp(&row_b)
    } else {
        a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}
