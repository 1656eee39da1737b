//! Shared HTML and pattern helpers.

use regex::Regex;
use scraper::{ElementRef, Selector};

/// Compiles a selector that is known at compile time to be valid.
///
/// # Panics
///
/// Panics if `css` is not a valid selector, which is a programming error.
pub(crate) fn compile_static_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid static selector '{css}': {e}"))
}

/// Compiles a regex that is known at compile time to be valid.
///
/// # Panics
///
/// Panics if `pattern` is not a valid regex.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Text content of an element with runs of whitespace collapsed.
pub(crate) fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
