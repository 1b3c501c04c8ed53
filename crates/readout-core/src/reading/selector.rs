//! Choice of the reading among merged tokens.

use tracing::trace;

use crate::models::config::SelectionConfig;

use super::patterns::PLAIN_NUMBER;

/// Range and denylist a reading must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRules {
    /// Smallest plausible reading (inclusive).
    pub min_value: f64,
    /// Largest plausible reading (inclusive).
    pub max_value: f64,
    /// Values that are OCR artifacts and never a reading.
    pub denylist: Vec<f64>,
}

impl ReadingRules {
    /// Build rules from the selection section of the configuration.
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self {
            min_value: config.min_value,
            max_value: config.max_value,
            denylist: config.denylist.clone(),
        }
    }

    /// Whether `value` can be a reading.
    pub fn accepts(&self, value: f64) -> bool {
        (self.min_value..=self.max_value).contains(&value) && !self.denylist.contains(&value)
    }

    /// All merged tokens that qualify, as numbers, in original order.
    pub fn candidates<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<f64> {
        tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| PLAIN_NUMBER.is_match(t))
            .filter_map(|t| t.parse::<f64>().ok())
            .filter(|v| self.accepts(*v))
            .collect()
    }

    /// The first qualifying token, or `None`.
    ///
    /// First in OCR order, not the largest.
    pub fn select<S: AsRef<str>>(&self, tokens: &[S]) -> Option<f64> {
        let candidates = self.candidates(tokens);
        trace!("Qualifying candidates: {:?}", candidates);
        candidates.first().copied()
    }
}

impl Default for ReadingRules {
    fn default() -> Self {
        Self::from_config(&SelectionConfig::default())
    }
}

/// Select the reading with the default rules.
pub fn select<S: AsRef<str>>(tokens: &[S]) -> Option<f64> {
    ReadingRules::default().select(tokens)
}
