//! Result of reading one document.

use serde::{Deserialize, Serialize};

/// Outcome of extracting the reading from a single document.
///
/// Produced once per document and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The reading, if any merged token passed the selection rules.
    pub selected_number: Option<f64>,

    /// Merged numeric tokens in OCR reading order.
    pub token_list: Vec<String>,
}

impl ExtractionResult {
    /// Whether a reading was found.
    pub fn has_reading(&self) -> bool {
        self.selected_number.is_some()
    }

    /// Merged tokens joined with single spaces.
    pub fn tokens_joined(&self) -> String {
        self.token_list.join(" ")
    }
}

/// Format a reading the way it appears on the form ("1200", "812.5").
pub fn format_reading(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}
