//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, read/idle timeouts, middleware)
//!     → request ID assigned, request span opened
//!     → routing (path lookup)
//!     → discovery.rs (fixed confirmation body)
//!     → Send to client with x-request-id echoed
//! ```

pub mod discovery;
pub mod server;

pub use discovery::{DiscoveryController, DISCOVERY_MESSAGE};
pub use server::{HttpServer, ServerError, ServerState, ServerTimeouts};
