//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection
//!     → server.rs (Axum setup, state machine, body accumulation)
//!     → [routing layer resolves the service segment]
//!     → request.rs (OutboundRequest: method, target URL, headers, body)
//!     → forwarder.rs (plaintext call under the upstream deadline)
//!     → response.rs (capture status/headers/body, relay)
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::Forwarder;
pub use request::{OutboundRequest, X_REQUEST_ID};
pub use response::InboundResponseCapture;
pub use server::HttpServer;
