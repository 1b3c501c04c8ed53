//! Pure Rust OCR backend using `pure-onnx-ocr`.

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use super::{reading_order, TextRecognizer};
use crate::error::OcrError;

/// Recognizer backed by PaddleOCR models run through `pure-onnx-ocr`.
///
/// Detected lines are re-assembled in reading order and joined with
/// newlines, so the output reads like tesseract's block mode.
pub struct OnnxRecognizer {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

impl OnnxRecognizer {
    /// Load `det.onnx`, `latin_rec.onnx` and `latin_dict.txt` from a directory.
    pub fn from_dir(model_dir: &Path) -> Result<Self, OcrError> {
        let det_path = model_dir.join("det.onnx");
        let rec_path = model_dir.join("latin_rec.onnx");
        let dict_path = model_dir.join("latin_dict.txt");

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", model_dir.display());

        Ok(Self { engine })
    }
}

impl TextRecognizer for OnnxRecognizer {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Engine(format!("pure-onnx-ocr: {}", e)))?;

        let mut lines: Vec<((f32, f32), String)> = results
            .iter()
            .map(|r| (top_left(&r.bounding_box), r.text.replace("[UNK]", " ")))
            .collect();
        lines.sort_by(|a, b| reading_order(a.0, b.0));

        let text = lines
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            "pure-onnx-ocr returned {} text regions in {}ms",
            results.len(),
            start.elapsed().as_millis()
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "onnx"
    }
}

/// Smallest x and y over the polygon's exterior.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    polygon
        .exterior()
        .coords()
        .fold((f32::INFINITY, f32::INFINITY), |(x, y), c| {
            (x.min(c.x as f32), y.min(c.y as f32))
        })
}
