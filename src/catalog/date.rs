//! Provider date formats.
//!
//! Edition URLs carry `YYYY-MM-DD`; edition pages display the issue date as
//! `March 2nd, 2019`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::error::CatalogError;
use crate::html::compile_static_regex;

/// Date format of edition path segments.
pub const EDITION_PATH_FORMAT: &str = "%Y-%m-%d";

/// Date format of the displayed issue date once the ordinal suffix is removed.
pub const ISSUE_DATE_FORMAT: &str = "%B %d, %Y";

/// `Month Nth, YYYY` anywhere in the text; the ordinal suffix is optional.
static DISPLAY_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)\b([a-z]+)\s+(\d{1,2})(?:st|nd|rd|th)?\s*,?\s*(\d{4})\b")
});

/// Parses an edition path segment such as `2019-03-02`.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidDate`] when the token is not a valid date.
pub fn parse_edition_token(token: &str) -> Result<NaiveDate, CatalogError> {
    let token = token.trim();
    NaiveDate::parse_from_str(token, EDITION_PATH_FORMAT)
        .map_err(|error| CatalogError::invalid_date(token, error))
}

/// Formats a date as an edition path segment.
#[must_use]
pub fn format_edition_token(date: NaiveDate) -> String {
    date.format(EDITION_PATH_FORMAT).to_string()
}

/// Parses the issue date displayed on an edition page.
///
/// The first `Month Nth, YYYY` run that is a real date wins; text around it
/// is ignored, so `"March 2nd, 2019 | Print edition"` parses as 2019-03-02.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidDate`] when no part of the text is a date
/// in the provider's display format.
pub fn parse_issue_date(text: &str) -> Result<NaiveDate, CatalogError> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut last_error = None;
    for captures in DISPLAY_DATE_RE.captures_iter(&collapsed) {
        let candidate = format!("{} {}, {}", &captures[1], &captures[2], &captures[3]);
        match NaiveDate::parse_from_str(&candidate, ISSUE_DATE_FORMAT) {
            Ok(date) => return Ok(date),
            Err(error) => last_error = Some(error.to_string()),
        }
    }
    Err(CatalogError::invalid_date(
        collapsed,
        last_error.unwrap_or_else(|| "no issue date found".to_string()),
    ))
}
