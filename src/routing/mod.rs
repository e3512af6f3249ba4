//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path)
//!     → router.rs (exact match on /api/{version}/{endpoint})
//!     → matched handler, or axum's default 404
//! ```
//!
//! # Design Decisions
//! - Routes are registered once before the listener accepts traffic
//! - No dynamic registration or removal

pub mod router;

pub use router::{api_prefix, build_routes, endpoint_path, API_VERSION, DISCOVERY_ENDPOINT};
