//! Repair of a leading "1" that OCR split off a four-digit reading.
//!
//! The reading field on this form is kerned so that a value such as `1123`
//! frequently comes back from OCR as `1` and `123`. The merge glues a bare
//! `1` to whatever token follows it. It is greedy and never backtracks:
//! plausibility of the merged value is decided later by the selector.

/// Merge each standalone `"1"` token with its immediate successor.
///
/// A trailing `"1"` with nothing after it is kept as is.
pub fn merge<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    let mut merged = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let current = tokens[i].as_ref();
        match tokens.get(i + 1) {
            Some(next) if current == "1" => {
                merged.push(format!("{}{}", current, next.as_ref()));
                i += 2;
            }
            _ => {
                merged.push(current.to_string());
                i += 1;
            }
        }
    }

    merged
}
