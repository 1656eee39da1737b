//! Transport construction for a session.
//!
//! A session needs two clients over one cookie jar: one that follows
//! redirects and one that stops at the first `Location` so the handshake can
//! read it. Redirect policy is per-client in reqwest, so both are built here
//! from the same options.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use super::error::RequestError;

/// Options shared by both session clients.
#[derive(Debug, Clone)]
pub(crate) struct TransportOptions {
    pub(crate) user_agent: String,
    pub(crate) proxy: Option<Proxy>,
    pub(crate) timeout: Option<Duration>,
}

/// Redirect handling for a session client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RedirectMode {
    Follow,
    Manual,
}

impl RedirectMode {
    fn policy(self) -> Policy {
        match self {
            Self::Follow => Policy::default(),
            Self::Manual => Policy::none(),
        }
    }
}

/// The redirect-following and redirect-stopping clients of one session.
#[derive(Debug, Clone)]
pub(crate) struct SessionTransport {
    pub(crate) follow: Client,
    pub(crate) manual: Client,
}

/// Parses a proxy URL into a proxy applied to every scheme.
///
/// HTTP, HTTPS and SOCKS proxies are accepted. PAC scripts are not
/// evaluated by the transport and are rejected.
///
/// # Errors
///
/// Returns [`RequestError::InvalidProxy`] for PAC URLs and unparsable values.
pub(crate) fn parse_proxy(proxy_url: &str) -> Result<Proxy, RequestError> {
    let trimmed = proxy_url.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("pac+") || lower.ends_with(".pac") {
        return Err(RequestError::invalid_proxy(
            trimmed,
            "PAC proxy configuration is not supported",
        ));
    }
    Proxy::all(trimmed).map_err(|error| RequestError::invalid_proxy(trimmed, error.to_string()))
}

/// Builds both session clients over `jar`.
///
/// # Errors
///
/// Returns [`RequestError::ClientBuild`] when either client cannot be built.
pub(crate) fn build_session_transport(
    options: &TransportOptions,
    jar: &Arc<Jar>,
) -> Result<SessionTransport, RequestError> {
    Ok(SessionTransport {
        follow: build_client(options, jar, RedirectMode::Follow)?,
        manual: build_client(options, jar, RedirectMode::Manual)?,
    })
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn build_client(
    options: &TransportOptions,
    jar: &Arc<Jar>,
    mode: RedirectMode,
) -> Result<Client, RequestError> {
    match try_build_client(options, jar, mode, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed macOS environments panic while reading system
            // proxy settings; retry without the system lookup.
            warn!("Session client hit system proxy panic; building without system proxy lookup");
            match try_build_client(options, jar, mode, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(RequestError::ClientBuild {
                    reason: "client construction panicked while initializing networking"
                        .to_string(),
                }),
                Err(BuildClientFailure::Build(error)) => Err(RequestError::ClientBuild {
                    reason: error.to_string(),
                }),
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(RequestError::ClientBuild {
            reason: error.to_string(),
        }),
    }
}

fn try_build_client(
    options: &TransportOptions,
    jar: &Arc<Jar>,
    mode: RedirectMode,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    let options = options.clone();
    let jar = Arc::clone(jar);
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(&options, jar, mode.policy());
        if disable_system_proxy_lookup {
            builder = builder.no_proxy();
            if let Some(proxy) = options.proxy {
                builder = builder.proxy(proxy);
            }
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(options: &TransportOptions, jar: Arc<Jar>, policy: Policy) -> ClientBuilder {
    let mut builder = Client::builder()
        .user_agent(options.user_agent.clone())
        .cookie_provider(jar)
        .redirect(policy)
        .gzip(true);

    // Connect and per-read limits only: a zip body may take far longer
    // than the timeout to stream in full.
    if let Some(timeout) = options.timeout {
        builder = builder.connect_timeout(timeout).read_timeout(timeout);
    }
    if let Some(proxy) = options.proxy.clone() {
        builder = builder.proxy(proxy);
    }

    builder
}
