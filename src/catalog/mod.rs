//! Edition discovery and artifact retrieval.
//!
//! [`EditionCatalog`] wraps an authenticated [`SessionClient`] and turns the
//! audio edition pages into dates, section names and zip downloads. Every
//! operation checks the session's login result before touching the network.
//!
//! ```no_run
//! use economist_audio_core::catalog::{EditionCatalog, EditionDate, Section};
//! use economist_audio_core::session::{Credentials, SessionClient, SessionOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SessionClient::new(
//!     Credentials::new("reader@example.com", "secret"),
//!     SessionOptions::default(),
//! )?;
//! let mut catalog = EditionCatalog::new(session);
//! catalog.login().await?;
//!
//! let page = catalog.fetch_edition_page(&EditionDate::Latest).await?;
//! let artifact = catalog
//!     .download_from_page(&page, Some(&Section::Name("Introduction".into())))
//!     .await?;
//! let mut file = tokio::fs::File::create("introduction.zip").await?;
//! artifact.write_to(&mut file).await?;
//! # Ok(())
//! # }
//! ```

mod artifact;
mod date;
mod error;
mod page;
mod selector;

use chrono::{Datelike, Local, NaiveDate};
use tracing::{debug, instrument};
use url::Url;

use crate::session::{AuthError, AuthResult, RequestError, SessionClient};

pub use artifact::DownloadArtifact;
pub use date::{
    EDITION_PATH_FORMAT, ISSUE_DATE_FORMAT, format_edition_token, parse_edition_token,
    parse_issue_date,
};
pub use error::{ArtifactError, CatalogError};
pub use page::{
    COVER_LINK_SELECTOR, EditionPage, FULL_ISSUE_LINK_SELECTOR, ISSUE_DATE_SELECTOR,
    SECTION_LINK_SELECTOR, parse_cover_dates, section_name_from_href,
};
pub use selector::{EditionDate, LATEST_ALIAS, Section};

/// Site section the session must have landed on.
pub const AUDIO_EDITION_DESTINATION: &str = "audio-edition";

const AUDIO_EDITION_PATH: &str = "/audio-edition/";
const COVERS_PATH: &str = "/audio-edition/covers";
const COVERS_YEAR_PARAM: &str = "date_filter[value][year]";

/// Audio edition listing and download operations over one session.
#[derive(Debug)]
pub struct EditionCatalog {
    session: SessionClient,
}

impl EditionCatalog {
    /// Wraps a session, logged in or not.
    #[must_use]
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    /// The underlying session.
    #[must_use]
    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    /// Gives back the underlying session.
    #[must_use]
    pub fn into_session(self) -> SessionClient {
        self.session
    }

    /// Logs the session in, landing on the audio edition.
    ///
    /// # Errors
    ///
    /// Returns the handshake's [`AuthError`].
    pub async fn login(&mut self) -> Result<AuthResult, AuthError> {
        self.session.login(Some(AUDIO_EDITION_DESTINATION)).await
    }

    /// Fails unless the session's last login landed on the audio edition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotAuthenticated`].
    pub fn ensure_authenticated(&self) -> Result<(), CatalogError> {
        match self.session.auth_result() {
            Some(auth) if auth.destination == AUDIO_EDITION_DESTINATION => Ok(()),
            other => Err(CatalogError::NotAuthenticated {
                expected: AUDIO_EDITION_DESTINATION,
                actual: other.map(|auth| auth.destination.clone()),
            }),
        }
    }

    /// Lists the editions published in `year` (default: the current year).
    ///
    /// Dates come back in the order the covers page shows them. Covers from
    /// other years are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotAuthenticated`] without a valid login,
    /// [`CatalogError::InvalidDate`] when a cover link does not end in a
    /// date, or a request error.
    #[instrument(skip(self))]
    pub async fn list_editions(&self, year: Option<i32>) -> Result<Vec<NaiveDate>, CatalogError> {
        self.ensure_authenticated()?;
        let year = year.unwrap_or_else(|| Local::now().year());
        let url = self.covers_url(year)?;

        debug!(url = %url, "Fetching edition covers");
        let html = self.session.get_text(url).await?;
        let mut dates = parse_cover_dates(&html)?;
        let total = dates.len();
        dates.retain(|date| date.year() == year);
        if dates.len() != total {
            debug!(dropped = total - dates.len(), "Ignoring covers from other years");
        }
        debug!(count = dates.len(), "Found editions");
        Ok(dates)
    }

    /// Fetches and parses one edition page.
    ///
    /// Pass the page to [`download_from_page`](Self::download_from_page)
    /// rather than fetching it again.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotAuthenticated`] without a valid login, or a
    /// request error.
    #[instrument(skip(self, edition), fields(edition = %edition))]
    pub async fn fetch_edition_page(
        &self,
        edition: &EditionDate,
    ) -> Result<EditionPage, CatalogError> {
        self.ensure_authenticated()?;
        let url = self.edition_url(edition)?;

        debug!(url = %url, "Fetching edition page");
        let html = self.session.get_text(url.clone()).await?;
        Ok(EditionPage::parse(url, &html))
    }

    /// Section names of an edition, in publication order.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_edition_page`](Self::fetch_edition_page).
    pub async fn list_sections(&self, edition: &EditionDate) -> Result<Vec<String>, CatalogError> {
        let page = self.fetch_edition_page(edition).await?;
        let sections = page.sections();
        debug!(count = sections.len(), "Found sections");
        Ok(sections)
    }

    /// Fetches an edition page and starts downloading the whole issue or one
    /// section.
    ///
    /// # Errors
    ///
    /// Same as [`download_from_page`](Self::download_from_page), plus the
    /// page fetch errors.
    pub async fn resolve_download(
        &self,
        edition: &EditionDate,
        section: Option<&Section>,
    ) -> Result<DownloadArtifact, CatalogError> {
        let page = self.fetch_edition_page(edition).await?;
        self.download_from_page(&page, section).await
    }

    /// Starts downloading the whole issue or one section of an
    /// already-fetched edition page.
    ///
    /// The returned artifact holds the live response; consume it once.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotAuthenticated`] without a valid login,
    /// [`CatalogError::InvalidSection`] when no section link matches,
    /// [`CatalogError::MissingElement`] or [`CatalogError::InvalidDate`] when
    /// the page structure differs, or a request error.
    #[instrument(skip(self, page), fields(page = %page.url()))]
    pub async fn download_from_page(
        &self,
        page: &EditionPage,
        section: Option<&Section>,
    ) -> Result<DownloadArtifact, CatalogError> {
        self.ensure_authenticated()?;
        let url = match section {
            Some(section) => page.section_url(section)?,
            None => page.full_issue_url()?,
        };
        let edition_date = page.issue_date()?;

        debug!(url = %url, %edition_date, "Requesting archive");
        let response = self.session.get(url.clone()).await?;
        Ok(DownloadArtifact::new(response, edition_date, url))
    }

    fn covers_url(&self, year: i32) -> Result<Url, RequestError> {
        let mut url = self.session.endpoints().site_url(COVERS_PATH)?;
        url.query_pairs_mut()
            .append_pair(COVERS_YEAR_PARAM, &year.to_string());
        Ok(url)
    }

    fn edition_url(&self, edition: &EditionDate) -> Result<Url, RequestError> {
        self.session
            .endpoints()
            .site_url(&format!("{AUDIO_EDITION_PATH}{}", edition.path_segment()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::{Credentials, SessionOptions};

    fn catalog() -> EditionCatalog {
        let session =
            SessionClient::new(Credentials::new("u", "p"), SessionOptions::default()).unwrap();
        EditionCatalog::new(session)
    }

    #[test]
    fn test_ensure_authenticated_rejects_anonymous_session() {
        let error = catalog().ensure_authenticated().unwrap_err();
        assert!(matches!(
            error,
            CatalogError::NotAuthenticated {
                expected: "audio-edition",
                actual: None
            }
        ));
    }

    #[test]
    fn test_covers_url_carries_year_filter() {
        let url = catalog().covers_url(2019).unwrap();
        assert_eq!(url.path(), "/audio-edition/covers");
        let pairs: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("date_filter[value][year]".to_string(), "2019".to_string())]
        );
    }

    #[test]
    fn test_edition_url_for_latest_and_dates() {
        let catalog = catalog();
        assert_eq!(
            catalog.edition_url(&EditionDate::Latest).unwrap().as_str(),
            "https://www.economist.com/audio-edition/latest"
        );
        let date = NaiveDate::from_ymd_opt(2019, 3, 2).unwrap();
        assert_eq!(
            catalog.edition_url(&date.into()).unwrap().as_str(),
            "https://www.economist.com/audio-edition/2019-03-02"
        );
    }

    #[tokio::test]
    async fn test_operations_fail_before_network_without_login() {
        let catalog = catalog();
        assert!(matches!(
            catalog.list_editions(Some(2019)).await,
            Err(CatalogError::NotAuthenticated { .. })
        ));
        assert!(matches!(
            catalog.list_sections(&EditionDate::Latest).await,
            Err(CatalogError::NotAuthenticated { .. })
        ));
        assert!(matches!(
            catalog.resolve_download(&EditionDate::Latest, None).await,
            Err(CatalogError::NotAuthenticated { .. })
        ));
    }
}
