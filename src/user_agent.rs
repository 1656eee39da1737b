//! Default User-Agent for session traffic.
//!
//! The SSO provider serves its browser login flow only to browser-like
//! clients, so sessions identify as desktop Chrome unless overridden.

/// Desktop Chrome User-Agent sent with every session request by default.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_4) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/57.0.2987.133 Safari/537.36";

/// Returns the User-Agent to use, falling back to [`DEFAULT_USER_AGENT`]
/// for `None` or blank overrides.
#[must_use]
pub(crate) fn resolve_user_agent(user_agent: Option<&str>) -> String {
    user_agent
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_USER_AGENT)
        .to_string()
}
