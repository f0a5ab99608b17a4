//! Response capture and relay.
//!
//! # Responsibilities
//! - Capture the upstream status, headers and full body
//! - Re-emit them to the client in order
//!
//! # Design Decisions
//! - Bodies are buffered completely before relaying; no streaming passthrough
//! - Hop-by-hop headers and `Content-Length` are dropped because the body is
//!   re-framed by the client-facing connection
//! - Upstream header lines without a colon are skipped by the client (see
//!   `Forwarder::new`); the remaining headers and the body are relayed

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderName, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};
use hyper::body::Incoming;

use crate::error::GatewayError;
use crate::security::headers::is_hop_by_hop;

/// Upstream response, fully buffered.
#[derive(Debug, Clone)]
pub struct InboundResponseCapture {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Bytes,
}

impl InboundResponseCapture {
    /// Buffer `response`, refusing bodies larger than `limit` bytes.
    pub async fn capture(
        service: &str,
        response: Response<Incoming>,
        limit: usize,
    ) -> Result<Self, GatewayError> {
        let (parts, body) = response.into_parts();

        let headers = parts
            .headers
            .iter()
            .filter(|(name, _)| is_relayable(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let body = axum::body::to_bytes(Body::new(body), limit)
            .await
            .map_err(|e| GatewayError::UpstreamBody {
                service: service.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            status: parts.status,
            headers,
            body,
        })
    }
}

fn is_relayable(name: &HeaderName) -> bool {
    !is_hop_by_hop(name) && *name != header::CONTENT_LENGTH
}

impl IntoResponse for InboundResponseCapture {
    fn into_response(self) -> axum::response::Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        response
    }
}
