//! Identity API
//!
//! # Architecture Overview
//!
//! ```text
//!   .env + environment
//!          │
//!          ▼
//!   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐    ┌─────────────┐
//!   │   config    │───▶│  database   │───▶│   routing    │───▶│ http server │
//!   │  (loader)   │    │ (pool+ping) │    │ (/api/v1/..) │    │ (background)│
//!   └─────────────┘    └─────────────┘    └──────────────┘    └──────┬──────┘
//!                                                                    │
//!   SIGINT / SIGTERM ──▶ lifecycle ──▶ stop accept ──▶ drain (60s) ──┘
//! ```
//!
//! Every startup stage returns a `Result`; this file is the only place that
//! turns an error into a non-zero exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Span;

use identity_api::config::{self, ServiceConfig};
use identity_api::lifecycle::{Application, LifecycleError};
use identity_api::observability::logging::{self, LogFormat};

/// Identity API: discovery endpoint backed by PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "identity-api", version, about)]
struct Args {
    /// Path to an environment file (defaults to ./.env when present)
    #[arg(short, long)]
    env_file: Option<PathBuf>,

    /// Log level filter (e.g., "identity_api=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: CLI > env > default
    logging::init(&logging::resolve_filter(args.log_level), args.log_format);
    let root = logging::root_span();

    match run(args.env_file, root.clone()).await {
        Ok(()) => {
            tracing::info!(parent: &root, "Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(parent: &root, error = %e, "Identity API terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run(env_file: Option<PathBuf>, root: Span) -> Result<(), LifecycleError> {
    tracing::info!(
        parent: &root,
        version = env!("CARGO_PKG_VERSION"),
        "Starting Identity API"
    );

    if let Some(path) = config::load_env_file(env_file.as_deref())? {
        tracing::info!(parent: &root, path = %path.display(), "Loaded environment file");
    }
    let config = ServiceConfig::from_env()?;

    let app = Application::build(config, root).await?;
    app.run_until_signal().await
}
