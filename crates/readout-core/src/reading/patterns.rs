//! Regex patterns for reading extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Integer or decimal number standing on its own word boundaries.
    // ASCII digits only: other scripts' digits do not parse as f64.
    pub static ref NUMBER_TOKEN: Regex = Regex::new(
        r"\b[0-9]+(?:\.[0-9]+)?\b"
    ).unwrap();

    // A whole token that parses as a plain decimal number
    pub static ref PLAIN_NUMBER: Regex = Regex::new(
        r"^[0-9]+(?:\.[0-9]+)?$"
    ).unwrap();
}
