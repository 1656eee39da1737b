//! Wiremock emulation of the content site and the SSO provider.
//!
//! Both origins live on one mock server, so `Endpoints::new(uri, uri)`
//! points a session at it.

use std::io::{Cursor, Write};

use economist_audio_core::telemetry;
use economist_audio_core::{Credentials, Endpoints, SessionClient, SessionOptions};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "reader@example.com";
pub const PASSWORD: &str = "correct horse";
pub const CLIENT_ID: &str = "client-abc";
pub const LOGIN_STATE: &str = "login-state-123";
pub const CSRF_TOKEN: &str = "csrf-token-xyz";
pub const CLIENT_VERSION: &str = "9.10.1";
pub const RELAY_TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.payload.signature";
pub const ACCESS_CODE: &str = "access-code-777";
pub const RESULT_STATE: &str = "result-state-456";

pub fn session_for(server: &MockServer) -> SessionClient {
    let options = SessionOptions {
        endpoints: Endpoints::new(&server.uri(), &server.uri()).unwrap(),
        ..SessionOptions::default()
    };
    SessionClient::new(Credentials::new(USERNAME, PASSWORD), options).unwrap()
}

pub fn login_page_body() -> String {
    format!(
        r#"<html><head><script>!function(e){{var t={{}};e.exports={{raw:"1.0.0"}}}};var lib=function(e){{e.exports={{raw:"{CLIENT_VERSION}"}}}};</script></head><body><div id="auth0-login-container"></div></body></html>"#
    )
}

pub fn hidden_form_body(server: &MockServer) -> String {
    format!(
        r#"<html><body>
        <form method="post" name="hiddenform" action="{uri}/login/callback">
          <input type="hidden" name="wa" value="wsignin1.0">
          <input type="hidden" name="wresult" value="{RELAY_TOKEN}">
          <input type="hidden" name="wctx" value="{{&#34;strategy&#34;:&#34;auth0&#34;}}">
          <noscript><input type="submit" value="Continue"></noscript>
        </form>
        <script>window.setTimeout(function(){{document.forms[0].submit();}},0);</script>
        </body></html>"#,
        uri = server.uri()
    )
}

/// Site entry point redirecting to the authorize endpoint.
pub async fn mount_login_entry(server: &MockServer, destination: &str) {
    let authorize = format!(
        "{uri}/authorize?client_id={CLIENT_ID}&redirect_uri={uri}%2Flogin%2Fcallback&response_type=code&scope=openid%20profile&prompt=login",
        uri = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/user/login"))
        .and(query_param("destination", destination))
        .respond_with(ResponseTemplate::new(302).insert_header("location", authorize.as_str()))
        .mount(server)
        .await;
}

/// Authorize endpoint redirecting to the login page with a relative path.
pub async fn mount_authorize(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/authorize"))
        .and(query_param("client_id", CLIENT_ID))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "location",
            format!("/login?state={LOGIN_STATE}&client={CLIENT_ID}").as_str(),
        ))
        .mount(server)
        .await;
}

/// Login page with the bootstrap script and, optionally, the CSRF cookie.
pub async fn mount_login_page(server: &MockServer, body: String, set_csrf: bool) {
    let mut response = ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body);
    if set_csrf {
        response = response.insert_header(
            "set-cookie",
            format!("_csrf={CSRF_TOKEN}; Path=/usernamepassword/login; HttpOnly").as_str(),
        );
    }
    Mock::given(method("GET"))
        .and(path("/login"))
        .and(query_param("state", LOGIN_STATE))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Credential submission; only matches the exact payload and telemetry header.
pub async fn mount_submit(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/usernamepassword/login"))
        .and(header("content-type", "application/json"))
        .and(header(
            "auth0-client",
            telemetry::client_header_value(CLIENT_VERSION).as_str(),
        ))
        .and(body_partial_json(json!({
            "tenant": "theeconomist",
            "_intstate": "deprecated",
            "connection": "Drupal",
            "_csrf": CSRF_TOKEN,
            "state": LOGIN_STATE,
            "client_id": CLIENT_ID,
            "redirect_uri": format!("{}/login/callback", server.uri()),
            "scope": "openid profile",
            "response_type": "code",
            "username": USERNAME,
            "password": PASSWORD,
        })))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Callback receiving the relayed form.
pub async fn mount_callback(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/login/callback"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("origin", server.uri().as_str()))
        .and(body_string_contains("wa=wsignin1.0"))
        .and(body_string_contains(format!("wresult={RELAY_TOKEN}")))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn callback_redirect(server: &MockServer, destination: &str) -> ResponseTemplate {
    ResponseTemplate::new(302).insert_header(
        "location",
        format!(
            "{uri}/{destination}?state={RESULT_STATE}&code={ACCESS_CODE}&destination={destination}",
            uri = server.uri()
        )
        .as_str(),
    )
}

/// Landing page the callback redirects to.
pub async fn mount_landing(server: &MockServer, destination: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{destination}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "SESS=site-session; Path=/")
                .set_body_string("<html><body>Welcome</body></html>"),
        )
        .mount(server)
        .await;
}

/// Mounts every step of a successful login landing on `destination`.
pub async fn mount_handshake(server: &MockServer, destination: &str) {
    mount_login_entry(server, destination).await;
    mount_authorize(server).await;
    mount_login_page(server, login_page_body(), true).await;
    mount_submit(
        server,
        ResponseTemplate::new(200)
            .insert_header("content-type", "text/html")
            .set_body_string(hidden_form_body(server)),
    )
    .await;
    mount_callback(server, callback_redirect(server, destination)).await;
    mount_landing(server, destination).await;
}

pub const EDITION_DATE: &str = "2019-03-02";

/// Edition page with twelve sections. Links are root-relative so the mock
/// server's port never takes part in section matching.
pub fn edition_page_body() -> String {
    let cdn = "/media";
    let sections = [
        "01_Introduction",
        "02_The_world_this_week",
        "03_Leaders",
        "04_Letters",
        "05_Briefing",
        "06_United_States",
        "07_The_Americas",
        "08_Asia",
        "09_China",
        "10_Middle_East_and_Africa",
        "11_Europe",
        "12_Obituary",
    ];
    let links: String = sections
        .iter()
        .map(|s| {
            format!(
                r#"<li><a href="{cdn}/Issue_9133_20190302_The_Economist_{s}.zip">{s}</a></li>"#
            )
        })
        .collect();
    format!(
        r#"<html><body>
          <h1>Audio edition</h1>
          <span class="issue-date">March 2nd, 2019</span>
          <div class="audio-issue-full-download-link"><a href="/media/Issue_9133_20190302_The_Economist_Full_edition.zip">Full edition</a></div>
          <ul class="audio-sections">{links}</ul>
        </body></html>"#
    )
}

pub fn covers_page_body() -> String {
    r#"<html><body>
      <div class="audio-cover-image"><a href="/audio-edition/2019-03-09"><img src="a.jpg"></a></div>
      <div class="audio-cover-image"><a href="/audio-edition/2019-03-02"><img src="b.jpg"></a></div>
      <div class="audio-cover-image"><a href="/audio-edition/2019-02-23"><img src="c.jpg"></a></div>
    </body></html>"#
        .to_string()
}

/// Edition page, served for both `latest` and its date.
pub async fn mount_edition_page(server: &MockServer) {
    for segment in ["latest", EDITION_DATE] {
        Mock::given(method("GET"))
            .and(path(format!("/audio-edition/{segment}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(edition_page_body()))
            .mount(server)
            .await;
    }
}

pub async fn mount_covers(server: &MockServer, year: &str) {
    Mock::given(method("GET"))
        .and(path("/audio-edition/covers"))
        .and(query_param("date_filter[value][year]", year))
        .respond_with(ResponseTemplate::new(200).set_body_string(covers_page_body()))
        .mount(server)
        .await;
}

/// Serves `body` as the zip for `file_stem` under `/media/`.
pub async fn mount_zip(server: &MockServer, file_stem: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/media/Issue_9133_20190302_The_Economist_{file_stem}.zip"
        )))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/zip")
                .set_body_bytes(body),
        )
        .mount(server)
        .await;
}

/// A small real zip archive with one entry per `(name, contents)` pair.
pub fn sample_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
