//! Mock-site startup that tolerates sandboxes without localhost sockets.
//!
//! Set `ECONOMIST_AUDIO_REQUIRE_SOCKET_TESTS=1` in CI so a skipped mock-site
//! test fails instead.

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_SOCKETS_ENV: &str = "ECONOMIST_AUDIO_REQUIRE_SOCKET_TESTS";

fn sockets_required() -> bool {
    std::env::var(REQUIRE_SOCKETS_ENV).is_ok_and(|value| {
        ["1", "true", "yes"]
            .iter()
            .any(|flag| value.trim().eq_ignore_ascii_case(flag))
    })
}

/// Starts the mock site, or returns `None` when localhost cannot be bound.
///
/// The caller's location is captured here, before the future is polled, so
/// the skip notice names the test that was skipped.
#[track_caller]
pub fn start_mock_server_or_skip() -> impl Future<Output = Option<MockServer>> {
    let caller = Location::caller();
    let bindable = TcpListener::bind("127.0.0.1:0").is_ok();
    async move {
        if bindable {
            Some(MockServer::start().await)
        } else {
            report_skip(caller);
            None
        }
    }
}

fn report_skip(caller: &Location<'_>) {
    let notice = format!(
        "mock site for {}:{} needs a localhost socket and none can be bound",
        caller.file(),
        caller.line()
    );
    assert!(!sockets_required(), "{notice} ({REQUIRE_SOCKETS_ENV} is set)");
    eprintln!("skipping: {notice}; set {REQUIRE_SOCKETS_ENV}=1 to fail instead");
}
