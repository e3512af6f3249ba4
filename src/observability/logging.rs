//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Resolve the log filter (CLI flag, then `RUST_LOG`, then default)
//! - Provide the root span components derive their loggers from
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Text or JSON output, chosen on the command line
//! - Components receive a `Span` at construction instead of reaching for globals

use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log filter when neither the CLI nor `RUST_LOG` set one.
pub const DEFAULT_LOG_FILTER: &str = "identity_api=info,tower_http=info";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Pick the filter directive: explicit value, then `RUST_LOG`, then the default.
pub fn resolve_filter(explicit: Option<String>) -> String {
    explicit
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

/// Install the global subscriber.
pub fn init(filter: &str, format: LogFormat) {
    let text = (format == LogFormat::Text).then(|| tracing_subscriber::fmt::layer());
    let json = (format == LogFormat::Json).then(|| tracing_subscriber::fmt::layer().json());

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(text)
        .with(json)
        .init();
}

/// Root span for the process. Component loggers are children of it.
pub fn root_span() -> Span {
    tracing::info_span!("identity_api")
}

/// Logger handed to a single component.
pub fn component_span(parent: &Span, component: &'static str) -> Span {
    tracing::info_span!(parent: parent, "component", component = component)
}
