//! Rules turning raw OCR text into a reading.
//!
//! Pipeline tail: [`tokenize`] the text, [`merge`] split leading ones, then
//! pick the first token accepted by [`ReadingRules`]. None of this touches
//! the OCR engine, so it runs outside the render/OCR lock.

pub mod merger;
pub mod patterns;
pub mod selector;
pub mod tokenizer;

pub use merger::merge;
pub use selector::{select, ReadingRules};
pub use tokenizer::tokenize;

use tracing::debug;

/// Tokens and selection derived from one OCR text.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Merged tokens in reading order.
    pub tokens: Vec<String>,
    /// The chosen reading, if any.
    pub value: Option<f64>,
}

impl ReadingRules {
    /// Run tokenize, merge and select over `text`.
    pub fn extract(&self, text: &str) -> Reading {
        let raw = tokenize(text);
        let tokens = merge(&raw);
        let value = self.select(&tokens);

        debug!("Tokens {:?} -> merged {:?} -> {:?}", raw, tokens, value);

        Reading { tokens, value }
    }
}
