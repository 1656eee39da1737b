//! Authenticated session client.
//!
//! [`SessionClient`] owns one cookie jar and one pair of HTTP clients, runs
//! the multi-hop SSO login handshake, and exposes the authenticated session
//! to dependents through [`SessionClient::request`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, ORIGIN, REFERER};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use super::error::{AuthError, LoginStep, RequestError};
use super::extract::{
    cookie_value, encode_form, extract_client_version, extract_hidden_form, location_header,
    query_param, redact_url, resolve_location,
};
use super::http_client::{
    SessionTransport, TransportOptions, build_session_transport, parse_proxy,
};
use crate::telemetry;
use crate::user_agent::resolve_user_agent;

/// Default content site origin.
pub const DEFAULT_SITE_ORIGIN: &str = "https://www.economist.com";
/// Default SSO provider origin.
pub const DEFAULT_AUTH_ORIGIN: &str = "https://authenticate.economist.com";

const LOGIN_ENTRY_PATH: &str = "/user/login";
const CREDENTIALS_PATH: &str = "/usernamepassword/login";
const CALLBACK_PATH: &str = "/login/callback";
const CSRF_COOKIE: &str = "_csrf";
const AUTH0_CLIENT_HEADER: &str = "Auth0-Client";
const UPGRADE_INSECURE_REQUESTS: &str = "Upgrade-Insecure-Requests";

const LOGIN_TENANT: &str = "theeconomist";
const LOGIN_INTSTATE: &str = "deprecated";
const LOGIN_CONNECTION: &str = "Drupal";

/// Account credentials. Never logged.
#[derive(Clone)]
pub struct Credentials {
    /// Account e-mail address.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Origins of the content site and of the SSO provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Content site origin, e.g. `https://www.economist.com`.
    pub site: Url,
    /// SSO provider origin, e.g. `https://authenticate.economist.com`.
    pub auth: Url,
}

impl Endpoints {
    /// Creates endpoints from two origin strings.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidUrl`] when either origin does not parse.
    pub fn new(site: &str, auth: &str) -> Result<Self, RequestError> {
        let site = Url::parse(site).map_err(|_| RequestError::invalid_url(site))?;
        let auth = Url::parse(auth).map_err(|_| RequestError::invalid_url(auth))?;
        Ok(Self { site, auth })
    }

    /// Joins `path` (which may carry a query) onto the site origin.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidUrl`] when the result does not parse.
    pub fn site_url(&self, path: &str) -> Result<Url, RequestError> {
        self.site
            .join(path)
            .map_err(|_| RequestError::invalid_url(format!("{}{path}", self.site)))
    }

    fn auth_url(&self, path: &str) -> Result<Url, RequestError> {
        self.auth
            .join(path)
            .map_err(|_| RequestError::invalid_url(format!("{}{path}", self.auth)))
    }

    /// Origin string of the SSO provider without a trailing slash.
    fn auth_origin(&self) -> String {
        self.auth.origin().ascii_serialization()
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        // Both constants are valid absolute URLs.
        #[allow(clippy::expect_used)]
        Self::new(DEFAULT_SITE_ORIGIN, DEFAULT_AUTH_ORIGIN).expect("default origins parse")
    }
}

/// Construction options for a [`SessionClient`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// User-Agent override; blank or `None` uses the default browser UA.
    pub user_agent: Option<String>,
    /// Outbound proxy URL (HTTP, HTTPS or SOCKS).
    pub proxy_url: Option<String>,
    /// Site and SSO origins.
    pub endpoints: Endpoints,
    /// Connect and per-read timeout imposed by the caller. A body that keeps
    /// streaming is never cut off. `None` means no timeout.
    pub timeout: Option<Duration>,
    /// Existing cookie jar to share; a fresh jar is created when `None`.
    pub cookie_jar: Option<Arc<Jar>>,
}

/// Values returned in the final redirect of a successful login.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// Opaque state echoed by the site.
    pub state: String,
    /// Opaque access code. Never parsed or logged.
    pub code: String,
    /// Site section the login landed on.
    pub destination: String,
}

impl std::fmt::Debug for AuthResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResult")
            .field("state", &self.state)
            .field("code", &"<redacted>")
            .field("destination", &self.destination)
            .finish()
    }
}

/// Lifecycle of a session's authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No login attempted yet.
    Anonymous,
    /// A login handshake is in progress.
    Authenticating,
    /// The last login completed.
    Authenticated,
    /// The last login failed; cookies set so far are kept.
    Failed,
}

#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    tenant: &'static str,
    #[serde(rename = "_intstate")]
    intstate: &'static str,
    connection: &'static str,
    #[serde(rename = "_csrf")]
    csrf: &'a str,
    state: &'a str,
    client_id: &'a str,
    redirect_uri: &'a str,
    scope: &'a str,
    response_type: &'a str,
    username: &'a str,
    password: &'a str,
}

/// Parameters the authorize redirect carries into the credential submission.
#[derive(Debug)]
struct AuthorizeParams {
    client_id: String,
    redirect_uri: String,
    response_type: String,
    scope: String,
}

/// One authenticated session against the content site.
///
/// `login` takes `&mut self`, so a single instance cannot run two handshakes
/// at once. Independent instances share nothing unless given the same jar.
pub struct SessionClient {
    credentials: Credentials,
    endpoints: Endpoints,
    jar: Arc<Jar>,
    transport: SessionTransport,
    auth: Option<AuthResult>,
    state: SessionState,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("credentials", &self.credentials)
            .field("endpoints", &self.endpoints)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionClient {
    /// Creates an anonymous session.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when the proxy URL is rejected or the HTTP
    /// clients cannot be built.
    pub fn new(credentials: Credentials, options: SessionOptions) -> Result<Self, RequestError> {
        let proxy = options.proxy_url.as_deref().map(parse_proxy).transpose()?;
        let transport_options = TransportOptions {
            user_agent: resolve_user_agent(options.user_agent.as_deref()),
            proxy,
            timeout: options.timeout,
        };
        let jar = options.cookie_jar.unwrap_or_default();
        let transport = build_session_transport(&transport_options, &jar)?;

        Ok(Self {
            credentials,
            endpoints: options.endpoints,
            jar,
            transport,
            auth: None,
            state: SessionState::Anonymous,
        })
    }

    /// Credentials this session logs in with.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Site and SSO origins.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The session's cookie jar.
    #[must_use]
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Result of the last successful login, if the session is authenticated.
    #[must_use]
    pub fn auth_result(&self) -> Option<&AuthResult> {
        self.auth.as_ref()
    }

    /// Whether the last login completed.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.auth.is_some()
    }

    /// Current authentication state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Starts a request under this session, following redirects.
    ///
    /// The request carries the session's cookie jar, User-Agent and proxy.
    /// No status check is applied; the caller owns the response.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.transport.follow.request(method, url)
    }

    /// Starts a request under this session that stops at the first redirect.
    pub fn request_without_redirects(&self, method: Method, url: Url) -> RequestBuilder {
        self.transport.manual.request(method, url)
    }

    /// GETs `url` under this session and fails on a non-success status.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Network`] or [`RequestError::HttpStatus`].
    pub async fn get(&self, url: Url) -> Result<Response, RequestError> {
        let url_text = url.to_string();
        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|error| RequestError::network(&url_text, error))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RequestError::http_status(url_text, status.as_u16()));
        }
        Ok(response)
    }

    /// GETs `url` and returns the body text.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus body read failures.
    pub async fn get_text(&self, url: Url) -> Result<String, RequestError> {
        let url_text = url.to_string();
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|error| RequestError::network(url_text, error))
    }

    /// Runs the login handshake and stores the result on success.
    ///
    /// `destination` is the site section to land on after login. Any previous
    /// result is cleared first, so a failed retry leaves the session
    /// unauthenticated. Cookies set by earlier steps are kept on failure.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] of the first step that did not produce what
    /// the next step needs.
    #[instrument(skip(self), fields(username = %self.credentials.username))]
    pub async fn login(&mut self, destination: Option<&str>) -> Result<AuthResult, AuthError> {
        self.auth = None;
        self.state = SessionState::Authenticating;

        match self.run_handshake(destination).await {
            Ok(result) => {
                debug!(destination = %result.destination, "Login complete");
                self.auth = Some(result.clone());
                self.state = SessionState::Authenticated;
                Ok(result)
            }
            Err(error) => {
                debug!(error = %error, "Login failed");
                self.state = SessionState::Failed;
                Err(error)
            }
        }
    }

    async fn run_handshake(&self, destination: Option<&str>) -> Result<AuthResult, AuthError> {
        // Steps 1-2: site entry point redirects to the SSO authorize endpoint.
        let entry_url = self.login_entry_url(destination)?;
        let authorize_url = self.follow_login_entry(&entry_url).await?;
        let params = authorize_params(&authorize_url)?;

        // Steps 3-4: authorize endpoint redirects to the SSO login page.
        let login_page_url = self.follow_authorize(&authorize_url).await?;
        let state = required_param(&login_page_url, "state")?;

        // Step 5: the login page embeds the client library version.
        let version = self.fetch_client_version(&login_page_url).await?;

        // Step 6: the login page set a CSRF cookie scoped to the submit path.
        let submit_url = self
            .endpoints
            .auth_url(CREDENTIALS_PATH)
            .map_err(|_| AuthError::invalid_url(LoginStep::SubmitCredentials, CREDENTIALS_PATH))?;
        let csrf = cookie_value(&self.jar, &submit_url, CSRF_COOKIE).ok_or_else(|| {
            AuthError::MissingCsrfCookie {
                url: submit_url.to_string(),
            }
        })?;
        debug!("Found CSRF cookie for credential submission");

        // Steps 7-8: submit credentials, read the hidden relay form.
        let payload = LoginPayload {
            tenant: LOGIN_TENANT,
            intstate: LOGIN_INTSTATE,
            connection: LOGIN_CONNECTION,
            csrf: &csrf,
            state: &state,
            client_id: &params.client_id,
            redirect_uri: &params.redirect_uri,
            scope: &params.scope,
            response_type: &params.response_type,
            username: &self.credentials.username,
            password: &self.credentials.password,
        };
        let relay_form = self
            .submit_credentials(&submit_url, &login_page_url, &payload, &version)
            .await?;

        // Step 9: relay the form to the callback, which redirects to the site.
        let success_url = self.submit_relay_form(&login_page_url, &relay_form).await?;

        // Step 10: read the result and let the site set its session cookies.
        let result = AuthResult {
            state: required_param(&success_url, "state")?,
            code: required_param(&success_url, "code")?,
            destination: required_param(&success_url, "destination")?,
        };
        self.land(&success_url).await?;

        Ok(result)
    }

    fn login_entry_url(&self, destination: Option<&str>) -> Result<Url, AuthError> {
        let mut url = self
            .endpoints
            .site_url(LOGIN_ENTRY_PATH)
            .map_err(|_| AuthError::invalid_url(LoginStep::LoginEntry, LOGIN_ENTRY_PATH))?;
        if let Some(destination) = destination {
            url.query_pairs_mut().append_pair("destination", destination);
        }
        Ok(url)
    }

    async fn follow_login_entry(&self, entry_url: &Url) -> Result<Url, AuthError> {
        debug!(url = %entry_url, "Requesting login entry point");
        let response = send_manual(
            LoginStep::LoginEntry,
            self.request_without_redirects(Method::GET, entry_url.clone()),
        )
        .await?;
        let location = location_header(&response).ok_or_else(|| AuthError::NoLoginRedirect {
            url: entry_url.to_string(),
        })?;
        resolve_location(entry_url, &location)
            .ok_or_else(|| AuthError::invalid_url(LoginStep::LoginEntry, location))
    }

    async fn follow_authorize(&self, authorize_url: &Url) -> Result<Url, AuthError> {
        debug!(url = %authorize_url, "Requesting authorize endpoint");
        let response = send_manual(
            LoginStep::Authorize,
            self.request_without_redirects(Method::GET, authorize_url.clone()),
        )
        .await?;
        let location =
            location_header(&response).ok_or_else(|| AuthError::NoAuthorizeRedirect {
                url: authorize_url.to_string(),
            })?;
        // The login page path is relative to the SSO origin.
        resolve_location(&self.endpoints.auth, &location)
            .ok_or_else(|| AuthError::invalid_url(LoginStep::Authorize, location))
    }

    async fn fetch_client_version(&self, login_page_url: &Url) -> Result<String, AuthError> {
        debug!(url = %login_page_url, "Requesting SSO login page");
        let response = send_checked(
            LoginStep::LoginPage,
            self.request(Method::GET, login_page_url.clone()),
            login_page_url,
        )
        .await?;
        let body = response.text().await.map_err(|error| {
            AuthError::network(LoginStep::LoginPage, login_page_url.as_str(), error)
        })?;
        let version = extract_client_version(&body).ok_or_else(|| {
            AuthError::TelemetryMarkerNotFound {
                url: login_page_url.to_string(),
            }
        })?;
        debug!(version, "Found SSO client library version");
        Ok(version.to_string())
    }

    async fn submit_credentials(
        &self,
        submit_url: &Url,
        login_page_url: &Url,
        payload: &LoginPayload<'_>,
        version: &str,
    ) -> Result<Vec<(String, String)>, AuthError> {
        debug!(url = %submit_url, "Submitting credentials");
        let request = self
            .request(Method::POST, submit_url.clone())
            .json(payload)
            .header(AUTH0_CLIENT_HEADER, telemetry::client_header_value(version))
            .header(REFERER, login_page_url.as_str());
        let response = send_checked(LoginStep::SubmitCredentials, request, submit_url).await?;
        let body = response.text().await.map_err(|error| {
            AuthError::network(LoginStep::SubmitCredentials, submit_url.as_str(), error)
        })?;

        let fields = extract_hidden_form(&body);
        if fields.is_empty() {
            return Err(AuthError::HiddenFormNotFound {
                url: submit_url.to_string(),
            });
        }
        debug!(fields = fields.len(), "Collected hidden relay form");
        Ok(fields)
    }

    async fn submit_relay_form(
        &self,
        login_page_url: &Url,
        fields: &[(String, String)],
    ) -> Result<Url, AuthError> {
        let callback_url = self
            .endpoints
            .auth_url(CALLBACK_PATH)
            .map_err(|_| AuthError::invalid_url(LoginStep::Callback, CALLBACK_PATH))?;
        debug!(url = %callback_url, "Relaying hidden form to callback");
        let request = self
            .request_without_redirects(Method::POST, callback_url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(UPGRADE_INSECURE_REQUESTS, "1")
            .header(REFERER, login_page_url.as_str())
            .header(ORIGIN, self.endpoints.auth_origin())
            .body(encode_form(fields));
        let response = send_manual(LoginStep::Callback, request).await?;
        let location = location_header(&response).ok_or_else(|| AuthError::NoCallbackRedirect {
            url: callback_url.to_string(),
        })?;
        resolve_location(&callback_url, &location)
            .ok_or_else(|| AuthError::invalid_url(LoginStep::Callback, redact_url(&location)))
    }

    async fn land(&self, success_url: &Url) -> Result<(), AuthError> {
        debug!(path = success_url.path(), "Requesting post-login landing page");
        send_checked(
            LoginStep::Landing,
            self.request(Method::GET, success_url.clone()),
            success_url,
        )
        .await?;
        Ok(())
    }
}

/// Sends a redirect-stopping request; any status is accepted.
async fn send_manual(step: LoginStep, request: RequestBuilder) -> Result<Response, AuthError> {
    request.send().await.map_err(|error| {
        let url = error
            .url()
            .map(|url| redact_url(url.as_str()).into_owned())
            .unwrap_or_default();
        AuthError::network(step, url, error.without_url())
    })
}

/// Sends a request and rejects non-success statuses.
///
/// Error context carries the redacted URL; the transport error has its own
/// copy of the URL stripped.
async fn send_checked(
    step: LoginStep,
    request: RequestBuilder,
    url: &Url,
) -> Result<Response, AuthError> {
    let response = request
        .send()
        .await
        .map_err(|error| {
            AuthError::network(step, redact_url(url.as_str()), error.without_url())
        })?;
    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::rejected(step, redact_url(url.as_str()), status.as_u16()));
    }
    Ok(response)
}

fn authorize_params(authorize_url: &Url) -> Result<AuthorizeParams, AuthError> {
    Ok(AuthorizeParams {
        client_id: required_param(authorize_url, "client_id")?,
        redirect_uri: required_param(authorize_url, "redirect_uri")?,
        response_type: required_param(authorize_url, "response_type")?,
        scope: required_param(authorize_url, "scope")?,
    })
}

fn required_param(url: &Url, name: &'static str) -> Result<String, AuthError> {
    query_param(url, name)
        .ok_or_else(|| AuthError::missing_parameter(redact_url(url.as_str()), name))
}
