//! Economist Audio Core Library
//!
//! Logs in to economist.com through its SSO redirect chain and downloads the
//! audio edition as zip archives.
//!
//! # Architecture
//!
//! - [`telemetry`] - `Auth0-Client` header encoding
//! - [`session`] - login handshake and authenticated requests
//! - [`catalog`] - edition listing, section listing and downloads
//! - [`user_agent`] - default browser User-Agent
//!
//! The library emits `tracing` events but never installs a subscriber, and
//! reads no environment variables; callers pass configuration in through
//! [`SessionOptions`].

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
mod html;
pub mod session;
pub mod telemetry;
pub mod user_agent;

// Re-export commonly used types
pub use catalog::{
    AUDIO_EDITION_DESTINATION, ArtifactError, CatalogError, DownloadArtifact, EditionCatalog,
    EditionDate, EditionPage, Section,
};
pub use session::{
    AuthError, AuthResult, Credentials, Endpoints, RequestError, SessionClient, SessionOptions,
    SessionState,
};
pub use user_agent::DEFAULT_USER_AGENT;
