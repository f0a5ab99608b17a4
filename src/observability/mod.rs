//! Observability subsystem.
//!
//! ```text
//! http::server, net::connection, routing::table
//!     → logging.rs  (tracing subscriber: RUST_LOG, else LOG_LEVEL)
//!     → metrics.rs  (request counts, latency, live contexts, upstream failures)
//!
//! Metrics are exported on METRICS_ADDRESS only when enabled; otherwise the
//! `metrics` macros hit no recorder and cost nothing.
//! ```
//!
//! Every request log line carries the `x-request-id` assigned at the edge,
//! and the same id is forwarded to the upstream service.

pub mod logging;
pub mod metrics;
