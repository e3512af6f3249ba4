//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events under component spans)
//!
//! Consumers:
//!     → stdout (text or JSON)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through every request span

pub mod logging;

pub use logging::LogFormat;
