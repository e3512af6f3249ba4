//! Identity API service library.
//!
//! Boots from environment configuration, connects to PostgreSQL, serves the
//! discovery endpoint and shuts down gracefully on SIGINT/SIGTERM.

// Core subsystems
pub mod config;
pub mod database;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, LifecycleError, Shutdown};
