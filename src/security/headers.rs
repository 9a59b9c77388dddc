//! Header sanitization for forwarded requests and relayed responses.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers (and `Host`) before a request goes upstream
//! - Strip framing and identity headers before a response goes back
//!
//! # Design Decisions
//! - Both transforms are pure: they take a borrowed map and build a new one
//! - `HeaderMap` keys are lowercase, so matching is case-insensitive
//! - Repeated headers are preserved value by value, in original order

use axum::http::header::HeaderMap;

/// Headers that describe a single transport hop and must not be forwarded.
/// `host` is included because the outbound client derives it from the target.
/// Names are lowercase, matching `HeaderName::as_str`.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
];

/// Upstream response headers that must not reach the caller. The relayed
/// body is re-framed (and already decoded) by our own transport, and the
/// upstream server identity is not exposed.
pub const UNSAFE_RESPONSE_HEADERS: &[&str] = &[
    "content-length",
    "content-encoding",
    "transfer-encoding",
    "connection",
    "server",
];

/// Copy `headers` without the hop-by-hop set.
pub fn sanitize_request_headers(headers: &HeaderMap) -> HeaderMap {
    without(headers, HOP_BY_HOP_HEADERS)
}

/// Copy upstream response `headers` without the unsafe-response set.
pub fn sanitize_response_headers(headers: &HeaderMap) -> HeaderMap {
    without(headers, UNSAFE_RESPONSE_HEADERS)
}

fn without(headers: &HeaderMap, blocked: &[&str]) -> HeaderMap {
    let mut kept = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !blocked.contains(&name.as_str()) {
            kept.append(name.clone(), value.clone());
        }
    }
    kept
}
