//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → headers.rs (strip hop-by-hop, drop Content-Length)
//!     → forwarded upstream
//!
//! Upstream response headers
//!     → headers.rs (strip hop-by-hop)
//!     → relayed to client, CORS origin guaranteed
//! ```

pub mod headers;
