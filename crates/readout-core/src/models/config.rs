//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ReadoutError;

/// Main configuration for the readout pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadoutConfig {
    /// Page rendering configuration.
    pub render: RenderConfig,

    /// Rectangle holding the reading, in rendered-pixel coordinates.
    pub region: RegionConfig,

    /// Reading selection rules.
    pub selection: SelectionConfig,

    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// Batch processing configuration.
    pub batch: BatchConfig,
}

/// Which renderer turns page 1 into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    /// Full rasterization through libpdfium.
    Pdfium,
    /// Scanned pages only: resample the page's embedded image.
    Embedded,
}

/// Page rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Multiplier applied to the native page size (72 points per inch).
    pub scale: f32,

    /// Renderer backend.
    pub renderer: RendererKind,

    /// Directory holding libpdfium, searched before the system paths.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdfium_library_dir: Option<PathBuf>,

    /// Write every cropped region here as PNG (diagnostics only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_snapshot: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 6.0,
            renderer: RendererKind::Pdfium,
            pdfium_library_dir: None,
            debug_snapshot: None,
        }
    }
}

/// Crop rectangle in page-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            left: 0,
            top: 2200,
            width: 1200,
            height: 900,
        }
    }
}

/// Rules deciding which number counts as the reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Smallest plausible reading (inclusive).
    pub min_value: f64,

    /// Largest plausible reading (inclusive).
    pub max_value: f64,

    /// Values that are known OCR artifacts on this form.
    pub denylist: Vec<f64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_value: 600.0,
            max_value: 1400.0,
            denylist: vec![778.0, 683.0, 1123.0, 1581.0],
        }
    }
}

/// OCR backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngineKind {
    /// External `tesseract` executable.
    Tesseract,
    /// PaddleOCR models run through `pure-onnx-ocr`.
    Onnx,
}

/// Tesseract page segmentation modes that make sense for a small field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegMode {
    /// Fully automatic page segmentation (psm 3).
    Auto,
    /// A single column of text of variable sizes (psm 4).
    SingleColumn,
    /// A single uniform block of text (psm 6).
    SingleBlock,
    /// A single text line (psm 7).
    SingleLine,
    /// As much text as possible in no particular order (psm 11).
    SparseText,
}

impl PageSegMode {
    /// Numeric value passed to `tesseract --psm`.
    pub fn as_psm(self) -> u8 {
        match self {
            PageSegMode::Auto => 3,
            PageSegMode::SingleColumn => 4,
            PageSegMode::SingleBlock => 6,
            PageSegMode::SingleLine => 7,
            PageSegMode::SparseText => 11,
        }
    }
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// OCR backend.
    pub engine: OcrEngineKind,

    /// Tesseract executable name or path.
    pub tesseract_cmd: String,

    /// Tesseract language pack.
    pub language: String,

    /// Tesseract page segmentation mode.
    pub page_seg_mode: PageSegMode,

    /// Directory containing det.onnx, latin_rec.onnx and latin_dict.txt.
    pub model_dir: PathBuf,

    /// Extra attempts after an OCR engine failure (0 = no retry).
    pub max_retries: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            engine: OcrEngineKind::Tesseract,
            tesseract_cmd: "tesseract".to_string(),
            language: "eng".to_string(),
            page_seg_mode: PageSegMode::SingleBlock,
            model_dir: PathBuf::from("models"),
            max_retries: 0,
        }
    }
}

/// Batch processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Documents processed concurrently.
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { jobs: 4 }
    }
}

impl ReadoutConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Reject settings no document could ever succeed with.
    pub fn validate(&self) -> Result<(), ReadoutError> {
        if !(self.render.scale.is_finite() && self.render.scale > 0.0) {
            return Err(ReadoutError::Config(format!(
                "render.scale must be positive, got {}",
                self.render.scale
            )));
        }

        if self.region.width == 0 || self.region.height == 0 {
            return Err(ReadoutError::Config(
                "region.width and region.height must be non-zero".to_string(),
            ));
        }

        if self.selection.min_value > self.selection.max_value {
            return Err(ReadoutError::Config(format!(
                "selection.min_value ({}) exceeds selection.max_value ({})",
                self.selection.min_value, self.selection.max_value
            )));
        }

        if self.batch.jobs == 0 {
            return Err(ReadoutError::Config("batch.jobs must be at least 1".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_form_layout() {
        let config = ReadoutConfig::default();
        assert_eq!(config.render.scale, 6.0);
        assert_eq!(
            config.region,
            RegionConfig {
                left: 0,
                top: 2200,
                width: 1200,
                height: 900
            }
        );
        assert_eq!(config.selection.min_value, 600.0);
        assert_eq!(config.selection.max_value, 1400.0);
        assert_eq!(config.selection.denylist, vec![778.0, 683.0, 1123.0, 1581.0]);
        assert_eq!(config.ocr.page_seg_mode.as_psm(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ReadoutConfig =
            serde_json::from_str(r#"{"region": {"top": 1900}, "ocr": {"engine": "onnx"}}"#)
                .unwrap();
        assert_eq!(config.region.top, 1900);
        assert_eq!(config.region.width, 1200);
        assert_eq!(config.ocr.engine, OcrEngineKind::Onnx);
        assert_eq!(config.render.renderer, RendererKind::Pdfium);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = ReadoutConfig::default();
        config.selection.min_value = 1500.0;
        assert!(matches!(config.validate(), Err(ReadoutError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_region_and_bad_scale() {
        let mut config = ReadoutConfig::default();
        config.region.height = 0;
        assert!(config.validate().is_err());

        let mut config = ReadoutConfig::default();
        config.render.scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = ReadoutConfig::default();
        config.batch.jobs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ReadoutConfig::default();
        config.selection.denylist.push(999.0);
        config.save(&path).unwrap();

        let loaded = ReadoutConfig::from_file(&path).unwrap();
        assert_eq!(loaded.selection.denylist.len(), 5);
    }
}
