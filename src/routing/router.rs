//! Path-based service resolution.
//!
//! # Responsibilities
//! - Split `/<service>/<rest>` into a service key and a downstream path
//! - Bound the service key length
//! - Resolve the key through the [`RoutingTable`]
//! - Rebuild the query string from the parsed parameters
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Explicit "not found" rather than a default backend
//! - Query parameters are re-serialized in the client's order; empty pairs
//!   are dropped and no trailing separator is ever produced

use std::sync::Arc;

use axum::http::Uri;
use url::form_urlencoded;

use crate::error::GatewayError;
use crate::routing::table::RoutingTable;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub service: String,
    pub port: u16,
    /// Path forwarded upstream, always starting with `/`.
    pub downstream_path: String,
    /// Rebuilt query string including its leading `?`, or empty.
    pub query: String,
}

impl ResolvedRoute {
    /// `<path><query>` as sent on the upstream request line.
    pub fn path_and_query(&self) -> String {
        format!("{}{}", self.downstream_path, self.query)
    }
}

/// Resolves inbound URIs to upstream services.
#[derive(Debug, Clone)]
pub struct PathRouter {
    table: Arc<RoutingTable>,
    max_segment_len: usize,
}

impl PathRouter {
    pub fn new(table: Arc<RoutingTable>, max_segment_len: usize) -> Self {
        Self {
            table,
            max_segment_len,
        }
    }

    /// Resolve `uri` to a backend.
    pub fn resolve(&self, uri: &Uri) -> Result<ResolvedRoute, GatewayError> {
        let (segment, rest) = split_service_path(uri.path());

        if segment.len() > self.max_segment_len {
            return Err(GatewayError::SegmentTooLong {
                len: segment.len(),
                limit: self.max_segment_len,
            });
        }
        if segment.is_empty() {
            return Err(GatewayError::RouteNotFound {
                segment: String::new(),
            });
        }

        let entry = self
            .table
            .lookup(segment)
            .ok_or_else(|| GatewayError::RouteNotFound {
                segment: segment.to_string(),
            })?;

        let downstream_path = if rest.is_empty() { "/" } else { rest };

        Ok(ResolvedRoute {
            service: entry.service_name.clone(),
            port: entry.upstream_port,
            downstream_path: downstream_path.to_string(),
            query: rebuild_query(uri.query()),
        })
    }
}

/// Split a raw path into `(service, rest)`.
///
/// `rest` keeps its leading `/` and is empty when the path has no second
/// segment.
pub fn split_service_path(path: &str) -> (&str, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    }
}

/// Re-serialize a raw query string as `?k=v&k=v`, or an empty string when
/// there are no parameters. Parameters without `=` carry no value and are
/// dropped; `k=` keeps its empty value.
pub fn rebuild_query(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for pair in raw.split('&').filter(|pair| pair.contains('=')) {
        for (key, value) in form_urlencoded::parse(pair.as_bytes()) {
            if key.is_empty() {
                continue;
            }
            serializer.append_pair(&key, &value);
        }
    }

    let query = serializer.finish();
    if query.is_empty() {
        query
    } else {
        format!("?{query}")
    }
}
