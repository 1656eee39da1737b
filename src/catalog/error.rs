//! Error types for edition discovery and artifact retrieval.

use thiserror::Error;

use crate::session::RequestError;

/// Errors raised by [`EditionCatalog`](super::EditionCatalog) operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The session has not logged in, or landed somewhere other than the
    /// audio edition.
    #[error("not logged in to '{expected}' (session destination: {})", .actual.as_deref().unwrap_or("none"))]
    NotAuthenticated {
        /// Destination the catalog requires.
        expected: &'static str,
        /// Destination of the session's last login, if any.
        actual: Option<String>,
    },

    /// No section link on the edition page matched the requested section.
    #[error("invalid section '{section}': no matching section on the edition page")]
    InvalidSection {
        /// Section token that was searched for.
        section: String,
    },

    /// An element the page structure should contain was absent.
    #[error("element '{selector}' not found on {url}")]
    MissingElement {
        /// CSS selector that matched nothing.
        selector: &'static str,
        /// Page URL.
        url: String,
    },

    /// A date on the page or supplied by the caller did not parse.
    #[error("invalid date '{value}': {reason}")]
    InvalidDate {
        /// The text that failed to parse.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Underlying session request failure.
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl CatalogError {
    /// Creates an invalid date error.
    pub fn invalid_date(value: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidDate {
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a missing element error.
    pub fn missing_element(selector: &'static str, url: impl Into<String>) -> Self {
        Self::MissingElement {
            selector,
            url: url.into(),
        }
    }
}

/// Errors while consuming a [`DownloadArtifact`](super::DownloadArtifact).
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The body stream failed mid-transfer.
    #[error("network error reading {url}: {source}")]
    Network {
        /// Artifact URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Writing to the sink failed.
    #[error("IO error writing {url}: {source}")]
    Io {
        /// Artifact URL.
        url: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
