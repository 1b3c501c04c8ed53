//! OCR through the `tesseract` command-line tool.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

use image::{DynamicImage, ImageFormat};
use tracing::{debug, trace};

use super::TextRecognizer;
use crate::error::OcrError;
use crate::models::config::{OcrConfig, PageSegMode};

/// Recognizer that shells out to tesseract, one process per image.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: String,
    language: String,
    page_seg_mode: PageSegMode,
}

impl TesseractRecognizer {
    /// Create a recognizer running `command` with the given language pack
    /// and page segmentation mode.
    pub fn new(
        command: impl Into<String>,
        language: impl Into<String>,
        page_seg_mode: PageSegMode,
    ) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
            page_seg_mode,
        }
    }

    /// Create a recognizer from the OCR section of the configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            config.tesseract_cmd.clone(),
            config.language.clone(),
            config.page_seg_mode,
        )
    }

    /// Check whether the tesseract executable can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Arguments for one run over `input`, text written to stdout.
    fn args(&self, input: &Path) -> Vec<OsString> {
        vec![
            input.as_os_str().to_os_string(),
            "stdout".into(),
            "-l".into(),
            self.language.clone().into(),
            "--psm".into(),
            self.page_seg_mode.as_psm().to_string().into(),
        ]
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&mut self, image: &DynamicImage) -> Result<String, OcrError> {
        let start = Instant::now();

        let input = tempfile::Builder::new()
            .prefix("readout-crop-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| OcrError::Encode(format!("failed to create temp file: {}", e)))?;

        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::Encode(e.to_string()))?;

        let output = Command::new(&self.command)
            .args(self.args(input.path()))
            .output()
            .map_err(|e| OcrError::Unavailable(format!("{}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        trace!("Tesseract output: {:?}", text);
        debug!(
            "Tesseract (psm {}) returned {} chars in {}ms",
            self.page_seg_mode.as_psm(),
            text.len(),
            start.elapsed().as_millis()
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}
