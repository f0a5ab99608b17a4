//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (handshake against in-memory certificate and key)
//!     → connection.rs (context allocation, body accumulation)
//!     → Hand off to routing and forwarding
//!
//! Context States:
//!     New → Accumulating → Complete → released
//! ```
//!
//! # Design Decisions
//! - TLS is mandatory on the client side; backends are plaintext
//! - Each context tracked so leaks show up as a non-zero active count

pub mod connection;
pub mod tls;

pub use connection::{ConnectionContext, ConnectionId, ConnectionState, ConnectionTracker};
