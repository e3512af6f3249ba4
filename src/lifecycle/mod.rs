//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Database pool → Routes → Bind listener → Serve in background
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections (60s) → Close pool → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then database, then listener
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: forced close after deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, SHUTDOWN_TIMEOUT};
pub use signals::Signal;
pub use startup::{Application, LifecycleError};
