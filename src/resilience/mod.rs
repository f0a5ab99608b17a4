//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (enforce the fixed upstream deadline)
//!     → on timeout or connect failure: synthesized 500, no retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Exactly one forwarding attempt per request
//! - A slow backend occupies only the connection waiting on it

pub mod timeouts;

pub use timeouts::UpstreamDeadline;
