//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     SERVICES + <NAME>_PORT values
//!     → table.rs (validate, skip unusable entries)
//!     → Freeze as immutable RoutingTable
//!
//! Per request:
//!     Request path + query
//!     → router.rs (service segment, downstream path, rebuilt query)
//!     → Return: ResolvedRoute or RouteNotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins for duplicated service names

pub mod router;
pub mod table;

pub use router::{PathRouter, ResolvedRoute};
pub use table::{RouteEntry, RoutingTable};
