//! Live download of an edition or section zip.

use bytes::Bytes;
use chrono::NaiveDate;
use futures_util::{Stream, StreamExt};
use reqwest::Response;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use url::Url;

use super::error::ArtifactError;

/// A zip archive still on the wire, plus the date of its edition.
///
/// The body is read at most once: every consuming method takes `self`.
/// Dropping an artifact without consuming it closes the connection.
#[derive(Debug)]
pub struct DownloadArtifact {
    response: Response,
    edition_date: NaiveDate,
    url: Url,
}

impl DownloadArtifact {
    pub(crate) fn new(response: Response, edition_date: NaiveDate, url: Url) -> Self {
        Self {
            response,
            edition_date,
            url,
        }
    }

    /// Issue date displayed on the edition page.
    #[must_use]
    pub fn edition_date(&self) -> NaiveDate {
        self.edition_date
    }

    /// URL the archive is being downloaded from.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Body size announced by the server, if any.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Gives up the artifact wrapper and returns the raw response.
    #[must_use]
    pub fn into_response(self) -> Response {
        self.response
    }

    /// The body as a stream of chunks.
    pub fn bytes_stream(self) -> impl Stream<Item = Result<Bytes, reqwest::Error>> {
        self.response.bytes_stream()
    }

    /// Streams the whole body into `writer` and flushes it.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Network`] if the body stream fails and
    /// [`ArtifactError::Io`] if the writer does.
    pub async fn write_to<W>(self, writer: &mut W) -> Result<u64, ArtifactError>
    where
        W: AsyncWrite + Unpin,
    {
        let url = self.url.to_string();
        let mut stream = self.response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|source| ArtifactError::Network {
                url: url.clone(),
                source,
            })?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|source| ArtifactError::Io {
                    url: url.clone(),
                    source,
                })?;
            bytes_written += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|source| ArtifactError::Io { url, source })?;

        Ok(bytes_written)
    }

    /// Reads and discards the rest of the body, releasing the connection.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Network`] if the body stream fails.
    pub async fn drain(self) -> Result<u64, ArtifactError> {
        self.write_to(&mut tokio::io::sink()).await
    }
}
