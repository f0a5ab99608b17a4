//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs
//! - Translate the inbound request into an [`OutboundRequest`]
//! - Build the plaintext upstream target URL
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing, and forwarded upstream
//! - Headers are copied as an ordered list, minus hop-by-hop headers
//! - Body length is always explicit, taken from the buffer, never scanned

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::routing::ResolvedRoute;
use crate::security::headers::{connection_tokens, is_forwardable};

pub const X_REQUEST_ID: &str = "x-request-id";

/// UUID v4 request IDs for [`tower_http::request_id::SetRequestIdLayer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID assigned to `headers`, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Methods whose accumulated body is attached to the upstream call.
pub fn carries_body(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// `http://<host>:<port><downstream-path><query>`
pub fn target_url(host: &str, route: &ResolvedRoute) -> String {
    format!("http://{}:{}{}", host, route.port, route.path_and_query())
}

/// Everything needed to issue one upstream call.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub target: Uri,
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Bytes,
    pub timeout: Duration,
}

impl OutboundRequest {
    /// Translate an inbound request into its upstream counterpart.
    pub fn build(
        method: &Method,
        inbound_headers: &HeaderMap,
        route: &ResolvedRoute,
        upstream_host: &str,
        body: Bytes,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let url = target_url(upstream_host, route);
        let target: Uri = url
            .parse()
            .map_err(|e| GatewayError::InvalidUpstreamRequest(format!("{url}: {e}")))?;

        let tokens = connection_tokens(inbound_headers);
        let headers = inbound_headers
            .iter()
            .filter(|(name, _)| is_forwardable(name, &tokens))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let body = if carries_body(method) { body } else { Bytes::new() };

        Ok(Self {
            method: method.clone(),
            target,
            headers,
            body,
            timeout,
        })
    }

    /// Materialize as a hyper request.
    pub fn into_http(self) -> Result<Request<Body>, GatewayError> {
        let attach_body = carries_body(&self.method);
        let mut builder = Request::builder().method(self.method).uri(self.target);

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        let body = if attach_body {
            builder = builder.header(header::CONTENT_LENGTH, self.body.len());
            Body::from(self.body)
        } else {
            Body::empty()
        };

        builder
            .body(body)
            .map_err(|e| GatewayError::InvalidUpstreamRequest(e.to_string()))
    }
}
