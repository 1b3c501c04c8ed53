//! Lexical scan of OCR text for numeric tokens.

use super::patterns::NUMBER_TOKEN;

/// Extract every numeric substring from `text`, in order of appearance.
///
/// No filtering happens here: "0", "12.5" and "99999" are all tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    NUMBER_TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
