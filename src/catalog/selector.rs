//! Edition and section selectors accepted by catalog operations.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use super::date::{format_edition_token, parse_edition_token};
use super::error::CatalogError;

/// Path alias the provider uses for the most recent edition.
pub const LATEST_ALIAS: &str = "latest";

/// Which edition to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditionDate {
    /// The provider's most recent edition.
    #[default]
    Latest,
    /// The edition released on this day.
    On(NaiveDate),
}

impl EditionDate {
    /// Path segment for the edition page (`latest` or `YYYY-MM-DD`).
    #[must_use]
    pub fn path_segment(&self) -> String {
        match self {
            Self::Latest => LATEST_ALIAS.to_string(),
            Self::On(date) => format_edition_token(*date),
        }
    }
}

impl From<NaiveDate> for EditionDate {
    fn from(date: NaiveDate) -> Self {
        Self::On(date)
    }
}

impl FromStr for EditionDate {
    type Err = CatalogError;

    /// Accepts `latest` (any case), an empty string, `YYYY-MM-DD`, or an
    /// RFC 3339 timestamp whose date part is used.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(LATEST_ALIAS) {
            return Ok(Self::Latest);
        }
        let date_part = match trimmed.split_once('T') {
            Some((date, _)) if date.len() == 10 => date,
            _ => trimmed,
        };
        parse_edition_token(date_part).map(Self::On)
    }
}

impl fmt::Display for EditionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path_segment())
    }
}

/// A section of an edition, by position or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// One-based position within the edition (`1` is the introduction).
    Number(u32),
    /// Section name as it appears in the download link, e.g. `Introduction`.
    Name(String),
}

impl Section {
    /// Token searched for in section download links.
    ///
    /// Numbers below 10 are zero-padded to two digits.
    #[must_use]
    pub fn token(&self) -> String {
        match self {
            Self::Number(n) if *n < 10 => format!("{n:02}"),
            Self::Number(n) => n.to_string(),
            Self::Name(name) => name.clone(),
        }
    }
}

impl From<u32> for Section {
    fn from(n: u32) -> Self {
        Self::Number(n)
    }
}

impl FromStr for Section {
    type Err = CatalogError;

    /// All-digit input is a [`Section::Number`]; anything else is a name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidSection {
                section: String::new(),
            });
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed
                .parse::<u32>()
                .map(Self::Number)
                .map_err(|_| CatalogError::InvalidSection {
                    section: trimmed.to_string(),
                });
        }
        Ok(Self::Name(trimmed.to_string()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}
