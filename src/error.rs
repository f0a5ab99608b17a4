//! Per-request error taxonomy.
//!
//! Every variant is recovered locally into a well-formed client response.
//! Startup failures live in [`crate::config::ConfigError`] and
//! [`crate::net::tls::TlsError`] instead, since those are fatal.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const NOT_FOUND_BODY: &str = "404 - Not Found";
pub const BAD_REQUEST_BODY: &str = "400 - Bad Request";
pub const PAYLOAD_TOO_LARGE_BODY: &str = "413 - Payload Too Large";
pub const INTERNAL_ERROR_BODY: &str = "500 - Internal Server Error";

/// Errors raised while handling a single proxied request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Empty, unknown or unconfigured service segment.
    #[error("no route for service segment {segment:?}")]
    RouteNotFound { segment: String },

    /// Service segment longer than the configured bound.
    #[error("service segment is {len} bytes, limit is {limit}")]
    SegmentTooLong { len: usize, limit: usize },

    /// Accumulated request body exceeded the configured bound.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    /// The client's body stream failed mid-upload.
    #[error("failed to read request body: {0}")]
    ClientBody(String),

    /// Buffer growth failed.
    #[error("failed to grow body buffer to {requested} bytes")]
    Allocation { requested: usize },

    /// The outbound request could not be assembled (bad URI or header).
    #[error("invalid upstream request: {0}")]
    InvalidUpstreamRequest(String),

    /// The upstream did not answer within the deadline.
    #[error("upstream {service} timed out after {secs}s")]
    UpstreamTimeout { service: String, secs: u64 },

    /// Connect failure or protocol error talking to the upstream.
    #[error("upstream {service} unavailable: {reason}")]
    UpstreamUnavailable { service: String, reason: String },

    /// The upstream response body could not be buffered.
    #[error("failed to read upstream {service} body: {reason}")]
    UpstreamBody { service: String, reason: String },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::SegmentTooLong { .. } | GatewayError::ClientBody(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::Allocation { .. }
            | GatewayError::InvalidUpstreamRequest(_)
            | GatewayError::UpstreamTimeout { .. }
            | GatewayError::UpstreamUnavailable { .. }
            | GatewayError::UpstreamBody { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::RouteNotFound { .. } => "route_not_found",
            GatewayError::SegmentTooLong { .. } => "segment_too_long",
            GatewayError::BodyTooLarge { .. } => "body_too_large",
            GatewayError::ClientBody(_) => "client_body",
            GatewayError::Allocation { .. } => "allocation",
            GatewayError::InvalidUpstreamRequest(_) => "invalid_upstream_request",
            GatewayError::UpstreamTimeout { .. } => "timeout",
            GatewayError::UpstreamUnavailable { .. } => "unavailable",
            GatewayError::UpstreamBody { .. } => "upstream_body",
        }
    }

    fn body(&self) -> &'static str {
        match self.status() {
            StatusCode::NOT_FOUND => NOT_FOUND_BODY,
            StatusCode::BAD_REQUEST => BAD_REQUEST_BODY,
            StatusCode::PAYLOAD_TOO_LARGE => PAYLOAD_TOO_LARGE_BODY,
            _ => INTERNAL_ERROR_BODY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}
