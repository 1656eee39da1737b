//! Authenticated session establishment.
//!
//! This module turns a username and password into a cookie-backed session
//! through the provider's redirect-chain SSO flow:
//!
//! 1. site login entry point → SSO authorize endpoint (redirect, not followed)
//! 2. authorize endpoint → SSO login page (redirect, not followed)
//! 3. login page → client library version and CSRF cookie
//! 4. JSON credential submission → hidden relay form
//! 5. relay form → SSO callback → site landing URL carrying the result
//!
//! The resulting [`SessionClient`] issues arbitrary requests under the
//! session via [`SessionClient::request`].

mod client;
mod error;
mod extract;
mod http_client;

pub use client::{
    AuthResult, Credentials, DEFAULT_AUTH_ORIGIN, DEFAULT_SITE_ORIGIN, Endpoints, SessionClient,
    SessionOptions, SessionState,
};
pub use error::{AuthError, LoginStep, RequestError};
