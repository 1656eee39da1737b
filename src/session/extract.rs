//! Narrow extraction functions for the login handshake.
//!
//! Every value the handshake pulls out of a provider response goes through
//! one of these functions. They return `None` (or an empty collection) when
//! the expected structure is absent, and the caller turns that into the
//! step-specific [`AuthError`](super::AuthError).

use std::sync::LazyLock;

use std::borrow::Cow;

use regex::Regex;
use reqwest::Response;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::LOCATION;
use scraper::{Html, Selector};
use url::Url;

use crate::html::{compile_static_regex, compile_static_selector};

/// Text immediately preceding the client library version in the SSO
/// bootstrap script (`e.exports={raw:"9.10.1"}`).
pub(crate) const TELEMETRY_VERSION_MARKER: &str = "e.exports={raw:\"";

/// Name attribute of the provider's auto-submitting relay form.
pub(crate) const HIDDEN_FORM_NAME: &str = "hiddenform";

static HIDDEN_FORM_INPUTS: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector(&format!(r#"form[name="{HIDDEN_FORM_NAME}"] input[name]"#))
});

/// Access code query parameter on the callback result URL.
static ACCESS_CODE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"([?&]code=)[^&#]*"));

/// Masks the access code in a URL or raw `Location` value.
///
/// Every URL that ends up in an error or a log line goes through here.
pub(crate) fn redact_url(url: &str) -> Cow<'_, str> {
    ACCESS_CODE_PARAM.replace_all(url, "${1}***")
}

/// Returns the raw `Location` header of a response, if present and non-empty.
pub(crate) fn location_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

/// Resolves a `Location` value against the origin that issued it.
///
/// Relative paths are appended to `base`'s origin; absolute URLs are kept.
pub(crate) fn resolve_location(base: &Url, location: &str) -> Option<Url> {
    base.join(location).ok()
}

/// Returns the first value of query parameter `name` in `url`.
pub(crate) fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Extracts the client library version embedded in the SSO login page.
///
/// The last occurrence of the marker wins, and the version runs up to the
/// next double quote.
pub(crate) fn extract_client_version(body: &str) -> Option<&str> {
    let start = body.rfind(TELEMETRY_VERSION_MARKER)? + TELEMETRY_VERSION_MARKER.len();
    let rest = &body[start..];
    let end = rest.find('"').unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Returns the value of cookie `name` that the jar would send to `url`.
pub(crate) fn cookie_value(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    let header = jar.cookies(url)?;
    let header = header.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Collects `name`/`value` pairs of every named input in the relay form.
///
/// Document order is preserved; inputs without a `value` attribute map to
/// an empty string.
pub(crate) fn extract_hidden_form(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    document
        .select(&HIDDEN_FORM_INPUTS)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

/// Encodes form fields as `application/x-www-form-urlencoded`.
pub(crate) fn encode_form(fields: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}
