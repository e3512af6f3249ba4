//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (optional) + process environment
//!     → loader.rs (read variables, apply environment suffixes)
//!     → validation.rs (environment tag, required values, port)
//!     → ServiceConfig (validated, immutable)
//!     → passed by reference to startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never reloaded
//! - Any missing or invalid setting is fatal
//! - Database name and user are scoped per environment by suffix

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_env_file, ConfigError};
pub use schema::{AppEnvironment, DatabaseConfig, ListenerConfig, ServiceConfig};
