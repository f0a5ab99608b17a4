//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a single fixed deadline
//! - Cancel the in-flight call cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from connect/protocol errors
//! - One attempt only; a timed-out call is never retried

use std::future::Future;
use std::time::Duration;

use crate::error::GatewayError;

/// Fixed deadline applied to every upstream call.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamDeadline {
    limit: Duration,
}

impl UpstreamDeadline {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Run `call`, converting an elapsed deadline into
    /// [`GatewayError::UpstreamTimeout`]. Dropping `call` on timeout releases
    /// everything it owns.
    pub async fn run<F, T>(&self, service: &str, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::UpstreamTimeout {
                service: service.to_string(),
                secs: self.limit.as_secs(),
            }),
        }
    }
}
