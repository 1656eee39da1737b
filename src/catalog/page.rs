//! Parsed edition pages and the provider's page structure.
//!
//! All CSS selectors for the audio edition site live here.

use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{Html, Selector};
use url::Url;

use super::date::{parse_edition_token, parse_issue_date};
use super::error::CatalogError;
use super::selector::Section;
use crate::html::{collapsed_text, compile_static_selector};

/// Edition cover links on the yearly covers page.
pub const COVER_LINK_SELECTOR: &str = ".audio-cover-image a";
/// Per-section download links on an edition page.
pub const SECTION_LINK_SELECTOR: &str = ".audio-sections a";
/// Whole-issue download link on an edition page.
pub const FULL_ISSUE_LINK_SELECTOR: &str = ".audio-issue-full-download-link a";
/// Displayed issue date on an edition page.
pub const ISSUE_DATE_SELECTOR: &str = ".issue-date";

/// Marker preceding the `NN_Section_Name.ext` tail of a section file name.
const SECTION_FILE_MARKER: &str = "_The_Economist_";

static COVER_LINKS: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(COVER_LINK_SELECTOR));
static SECTION_LINKS: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(SECTION_LINK_SELECTOR));
static FULL_ISSUE_LINK: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(FULL_ISSUE_LINK_SELECTOR));
static ISSUE_DATE: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(ISSUE_DATE_SELECTOR));

/// A fetched and parsed edition page.
///
/// Fetch once and pass it to every operation that needs the same edition.
pub struct EditionPage {
    url: Url,
    document: Html,
}

impl std::fmt::Debug for EditionPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditionPage")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

impl EditionPage {
    /// Parses an edition page served at `url`.
    #[must_use]
    pub fn parse(url: Url, html: &str) -> Self {
        Self {
            url,
            document: Html::parse_document(html),
        }
    }

    /// URL the page was fetched from.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The parsed document, for ad hoc queries.
    #[must_use]
    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Section names in publication order.
    #[must_use]
    pub fn sections(&self) -> Vec<String> {
        self.section_hrefs()
            .map(section_name_from_href)
            .collect()
    }

    /// Download URL of the first section link whose href contains the
    /// section's token.
    ///
    /// This is a substring match: `01` also matches a link whose date part
    /// contains `01`. The first link in document order wins.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidSection`] when no link matches.
    pub fn section_url(&self, section: &Section) -> Result<Url, CatalogError> {
        let token = section.token();
        let href = self
            .section_hrefs()
            .find(|href| href.contains(token.as_str()))
            .ok_or_else(|| CatalogError::InvalidSection {
                section: token.clone(),
            })?;
        self.absolutize(href)
    }

    /// Download URL of the whole issue.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingElement`] when the page has no
    /// full-issue link.
    pub fn full_issue_url(&self) -> Result<Url, CatalogError> {
        let href = self
            .document
            .select(&FULL_ISSUE_LINK)
            .find_map(|anchor| anchor.value().attr("href"))
            .ok_or_else(|| {
                CatalogError::missing_element(FULL_ISSUE_LINK_SELECTOR, self.url.as_str())
            })?;
        self.absolutize(href)
    }

    /// Issue date as displayed on the first `.issue-date` element.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingElement`] when the date element is
    /// absent and [`CatalogError::InvalidDate`] when its text does not parse.
    pub fn issue_date(&self) -> Result<NaiveDate, CatalogError> {
        let element = self.document.select(&ISSUE_DATE).next().ok_or_else(|| {
            CatalogError::missing_element(ISSUE_DATE_SELECTOR, self.url.as_str())
        })?;
        parse_issue_date(&collapsed_text(element))
    }

    fn section_hrefs(&self) -> impl Iterator<Item = &str> {
        self.document
            .select(&SECTION_LINKS)
            .filter_map(|anchor| anchor.value().attr("href"))
    }

    fn absolutize(&self, href: &str) -> Result<Url, CatalogError> {
        self.url
            .join(href.trim())
            .map_err(|_| CatalogError::Request(crate::session::RequestError::invalid_url(href)))
    }
}

/// Derives a section name from its download link.
///
/// `.../Issue_9133_20190302_The_Economist_05_The_world_this_week.zip`
/// becomes `The_world_this_week`: the tail after the last
/// `_The_Economist_` marker, minus the leading index token and the
/// extension.
#[must_use]
pub fn section_name_from_href(href: &str) -> String {
    let tail = href.rsplit(SECTION_FILE_MARKER).next().unwrap_or(href);
    let without_index = tail.split_once('_').map_or("", |(_, rest)| rest);
    without_index
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Parses edition dates from the yearly covers page, in document order.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidDate`] when a cover link's last path
/// segment is not a `YYYY-MM-DD` date.
pub fn parse_cover_dates(html: &str) -> Result<Vec<NaiveDate>, CatalogError> {
    let document = Html::parse_document(html);
    document
        .select(&COVER_LINKS)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| {
            let token = href
                .trim()
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .rsplit('/')
                .next()
                .unwrap_or_default();
            parse_edition_token(token)
        })
        .collect()
}
