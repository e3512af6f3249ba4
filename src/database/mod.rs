//! Database connectivity subsystem.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig
//!     → connection string (postgres://...)
//!     → connector.rs (create pool, ping)
//!     → SELECT version() (diagnostic only)
//!     → Database handle owned by the application
//! ```
//!
//! # Design Decisions
//! - Pool creation and ping failures are fatal at startup
//! - The version query is best effort
//! - The pool is closed once, on the exit path

pub mod connector;

pub use connector::{Database, DatabaseError};
