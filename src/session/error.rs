//! Error types for session establishment and session requests.
//!
//! Each login step has its own [`AuthError`] variant so a failure names the
//! point in the redirect chain where the provider's behaviour diverged.

use thiserror::Error;

/// Handshake step identifiers, used in error context and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    /// Site login entry point (redirects to the authorize endpoint).
    LoginEntry,
    /// SSO authorize endpoint (redirects to the login page).
    Authorize,
    /// SSO login page carrying the bootstrap script.
    LoginPage,
    /// JSON credential submission.
    SubmitCredentials,
    /// Hidden relay form submission to the SSO callback.
    Callback,
    /// Final landing request on the site.
    Landing,
}

impl LoginStep {
    /// Stable label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginEntry => "login entry",
            Self::Authorize => "authorize",
            Self::LoginPage => "login page",
            Self::SubmitCredentials => "credential submission",
            Self::Callback => "callback",
            Self::Landing => "landing",
        }
    }
}

impl std::fmt::Display for LoginStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while running the login handshake.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The site login entry point did not redirect.
    #[error("no redirect from login entry point {url}")]
    NoLoginRedirect {
        /// Requested URL.
        url: String,
    },

    /// The authorize endpoint did not redirect to the login page.
    #[error("no redirect from authorize endpoint {url}")]
    NoAuthorizeRedirect {
        /// Requested URL.
        url: String,
    },

    /// The login page did not embed the client library version marker.
    #[error("telemetry marker not found in login page {url}")]
    TelemetryMarkerNotFound {
        /// Login page URL.
        url: String,
    },

    /// The login page did not set the CSRF cookie for the submission path.
    #[error("missing csrf cookie for {url}")]
    MissingCsrfCookie {
        /// Credential submission URL the cookie must be scoped to.
        url: String,
    },

    /// The credential submission response had no hidden relay form.
    #[error("hidden form not found in response from {url}")]
    HiddenFormNotFound {
        /// Credential submission URL.
        url: String,
    },

    /// The SSO callback did not redirect back to the site.
    #[error("no redirect from callback {url}")]
    NoCallbackRedirect {
        /// Callback URL.
        url: String,
    },

    /// A redirect URL lacked a query parameter the handshake needs.
    #[error("missing query parameter '{name}' in {url}")]
    MissingParameter {
        /// URL whose query string was inspected.
        url: String,
        /// Name of the absent parameter.
        name: &'static str,
    },

    /// A redirect target could not be parsed as a URL.
    #[error("invalid URL during {step}: {url}")]
    InvalidUrl {
        /// Step that produced the URL.
        step: LoginStep,
        /// The offending value.
        url: String,
    },

    /// A step answered with a non-success status where a page was expected.
    ///
    /// Wrong credentials surface here, at [`LoginStep::SubmitCredentials`].
    #[error("HTTP {status} during {step} at {url}")]
    Rejected {
        /// Step that was rejected.
        step: LoginStep,
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Transport failure.
    #[error("network error during {step} at {url}: {source}")]
    Network {
        /// Step that failed.
        step: LoginStep,
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
}

impl AuthError {
    /// Creates a network error for a handshake step.
    pub fn network(step: LoginStep, url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            step,
            url: url.into(),
            source,
        }
    }

    /// Creates a rejected-status error for a handshake step.
    pub fn rejected(step: LoginStep, url: impl Into<String>, status: u16) -> Self {
        Self::Rejected {
            step,
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error for a handshake step.
    pub fn invalid_url(step: LoginStep, url: impl Into<String>) -> Self {
        Self::InvalidUrl {
            step,
            url: url.into(),
        }
    }

    /// Creates a missing query parameter error.
    pub fn missing_parameter(url: impl Into<String>, name: &'static str) -> Self {
        Self::MissingParameter {
            url: url.into(),
            name,
        }
    }
}

/// Errors from building the session transport or issuing session requests.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    ClientBuild {
        /// Why construction failed.
        reason: String,
    },

    /// The configured proxy URL was rejected.
    #[error("invalid proxy URL '{url}': {reason}")]
    InvalidProxy {
        /// The configured proxy URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A request URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending value.
        url: String,
    },

    /// Transport failure.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success response status.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },
}

impl RequestError {
    /// Creates a network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid proxy error.
    pub fn invalid_proxy(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProxy {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_messages_name_the_step() {
        let error = AuthError::NoLoginRedirect {
            url: "https://www.economist.com/user/login".to_string(),
        };
        assert!(error.to_string().contains("no redirect from login entry point"));

        let error = AuthError::rejected(
            LoginStep::SubmitCredentials,
            "https://authenticate.economist.com/usernamepassword/login",
            401,
        );
        let msg = error.to_string();
        assert!(msg.contains("401"), "Expected status in: {msg}");
        assert!(msg.contains("credential submission"), "Expected step in: {msg}");
    }

    #[test]
    fn test_missing_parameter_display() {
        let error = AuthError::missing_parameter("https://example.com/cb?code=1", "state");
        let msg = error.to_string();
        assert!(msg.contains("'state'"), "Expected parameter name in: {msg}");
        assert!(msg.contains("https://example.com/cb?code=1"));
    }

    #[test]
    fn test_request_error_http_status_display() {
        let error = RequestError::http_status("https://example.com/issue.zip", 404);
        assert_eq!(
            error.to_string(),
            "HTTP 404 requesting https://example.com/issue.zip"
        );
    }

    #[test]
    fn test_invalid_proxy_display() {
        let error = RequestError::invalid_proxy("pac+http://proxy/wpad.dat", "PAC is unsupported");
        let msg = error.to_string();
        assert!(msg.contains("pac+http://proxy/wpad.dat"));
        assert!(msg.contains("PAC is unsupported"));
    }
}
