//! Encoding for the `Auth0-Client` telemetry header.
//!
//! The SSO provider expects a URL-safe Base64 rendering of a small JSON
//! document describing the client library. The alphabet is standard Base64
//! with `+` replaced by `-` and `/` replaced by `_`, and `=` padding is kept.
//! The server validates the value, so the output must match byte for byte.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::Serialize;

/// Name reported for the client library in the telemetry header.
pub const TELEMETRY_CLIENT_NAME: &str = "auth0.js";

/// Encodes `text` for use as an `Auth0-Client` header value.
///
/// Each UTF-16 code unit contributes one byte (its low eight bits) to the
/// encoded stream, which is how the provider's bootstrap script packs the
/// string. ASCII input therefore encodes exactly like its UTF-8 bytes.
#[must_use]
pub fn encode(text: &str) -> String {
    let bytes: Vec<u8> = text.encode_utf16().map(|unit| (unit & 0xFF) as u8).collect();
    URL_SAFE.encode(bytes)
}

#[derive(Debug, Serialize)]
struct TelemetryData<'a> {
    name: &'a str,
    version: &'a str,
}

/// Builds the full `Auth0-Client` header value for a client library version.
///
/// The JSON key order is `name` then `version`.
#[must_use]
pub fn client_header_value(version: &str) -> String {
    let data = TelemetryData {
        name: TELEMETRY_CLIENT_NAME,
        version,
    };
    // Two string fields always serialize.
    let json = serde_json::to_string(&data).unwrap_or_default();
    encode(&json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn decode_url_safe(encoded: &str) -> Vec<u8> {
        let standard = encoded.replace('-', "+").replace('_', "/");
        STANDARD.decode(standard).unwrap()
    }

    #[test]
    fn test_encode_empty_string() {
        assert_eq!(encode(""), "");
    }

    #[test]
    fn test_encode_tail_padding() {
        assert_eq!(encode("a"), "YQ==");
        assert_eq!(encode("ab"), "YWI=");
        assert_eq!(encode("abc"), "YWJj");
    }

    #[test]
    fn test_encode_substitutes_url_safe_symbols() {
        // 0xFB 0xFF 0xBF packs to "+/+/" in the standard alphabet.
        let text: String = ['\u{FB}', '\u{FF}', '\u{BF}'].iter().collect();
        assert_eq!(encode(&text), "-_-_");
    }

    #[test]
    fn test_encode_round_trips_boundary_lengths() {
        for len in [0usize, 1, 2, 3, 16_382, 16_383, 16_384, 50_000] {
            let text: String = (0..len)
                .map(|i| char::from(b'!' + u8::try_from(i % 90).unwrap()))
                .collect();
            let encoded = encode(&text);
            assert!(!encoded.contains('+') && !encoded.contains('/'));
            assert_eq!(encoded.len() % 4, 0, "padded length for input len {len}");
            assert_eq!(decode_url_safe(&encoded), text.as_bytes(), "len {len}");
        }
    }

    #[test]
    fn test_encode_keeps_low_byte_of_code_units() {
        // U+0141 has low byte 0x41 ('A').
        assert_eq!(encode("\u{141}"), encode("A"));
    }

    #[test]
    fn test_client_header_value_encodes_name_then_version() {
        let value = client_header_value("9.10.1");
        let decoded = String::from_utf8(decode_url_safe(&value)).unwrap();
        assert_eq!(decoded, r#"{"name":"auth0.js","version":"9.10.1"}"#);
    }
}
