//! Header manipulation.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Build CORS preflight headers
//!
//! # Design Decisions
//! - `Host` is never forwarded; the upstream client derives it from the target URI
//! - `Content-Length` is always recomputed because bodies are re-framed

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::CorsConfig;

/// Headers meaningful only to a single transport hop (RFC 7230 §6.1), plus
/// `Host`.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
            | "host"
    )
}

/// Headers that must not be copied between the two HTTP stacks.
///
/// Also drops any header the inbound `Connection` header nominates.
pub fn is_forwardable(name: &HeaderName, connection_tokens: &[String]) -> bool {
    !is_hop_by_hop(name)
        && *name != header::CONTENT_LENGTH
        && !connection_tokens.iter().any(|t| t == name.as_str())
}

/// Lower-cased tokens listed in the `Connection` header.
pub fn connection_tokens(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// The three headers carried by a preflight reply.
pub fn preflight_headers(cors: &CorsConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, &cors.allow_origin),
        (header::ACCESS_CONTROL_ALLOW_METHODS, &cors.allow_methods),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, &cors.allow_headers),
    ] {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => tracing::warn!(header = %name, "Invalid CORS header value, omitted"),
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hop_by_hop() {
        assert!(is_hop_by_hop(&header::CONNECTION));
        assert!(is_hop_by_hop(&header::TRANSFER_ENCODING));
        assert!(is_hop_by_hop(&header::HOST));
        assert!(is_hop_by_hop(&HeaderName::from_static("keep-alive")));
        assert!(!is_hop_by_hop(&header::CONTENT_TYPE));
        assert!(!is_hop_by_hop(&header::AUTHORIZATION));
    }

    #[test]
    fn connection_nominated_headers_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("close, X-Trace-Hop"));
        let tokens = connection_tokens(&headers);
        assert_eq!(tokens, ["close", "x-trace-hop"]);

        assert!(!is_forwardable(&HeaderName::from_static("x-trace-hop"), &tokens));
        assert!(!is_forwardable(&header::CONTENT_LENGTH, &tokens));
        assert!(is_forwardable(&header::AUTHORIZATION, &tokens));
    }

    #[test]
    fn preflight_carries_three_cors_headers() {
        let headers = preflight_headers(&CorsConfig::default());
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
        assert!(headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS));
    }
}
