//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Bind address
//!     → listener.rs (bind, bind errors are fatal)
//!     → connection.rs (connection IDs, active count, idle timeout)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Binding happens during startup so a busy port aborts the process
//! - Each connection tracked for shutdown reporting

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker, IdleTimeout};
pub use listener::{bind, ListenerError};
