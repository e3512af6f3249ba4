//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the database pool and log its server version
//! - Construct handlers and register routes
//! - Bind the listener, then serve on a background task
//! - Wait for a termination signal and drive the shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and returned to `main`
//! - Subsystems initialize in order, not concurrently
//! - The pool is closed on every path after it was opened

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::Span;

use crate::config::{ConfigError, ServiceConfig};
use crate::database::{Database, DatabaseError};
use crate::http::{DiscoveryController, HttpServer, ServerError, ServerState, ServerTimeouts};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{self, Signal};
use crate::net;
use crate::observability::logging::component_span;
use crate::routing::build_routes;

/// Any error that ends the process with a failure exit code.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("server error: {0}")]
    Server(#[from] ServerError),

    #[error("failed to listen for termination signals: {0}")]
    Signal(#[source] io::Error),
}

/// A fully started service: pool open, routes registered, listener bound.
pub struct Application {
    database: Database,
    server: HttpServer,
    listener: TcpListener,
    shutdown: Shutdown,
    logger: Span,
}

impl Application {
    /// Run every startup stage in order.
    ///
    /// The listener is only bound once the database is reachable, so a failed
    /// connection never opens the port.
    pub async fn build(config: ServiceConfig, logger: Span) -> Result<Self, LifecycleError> {
        tracing::info!(
            parent: &logger,
            environment = %config.environment,
            "Application environment loaded"
        );

        let database = Database::connect(&config.database).await?;
        log_server_version(&database, &logger).await;

        let server = http_server(&logger);

        let listener = match net::bind(config.listener.bind_address).await {
            Ok(listener) => listener,
            Err(e) => {
                database.close().await;
                return Err(ServerError::from(e).into());
            }
        };

        Ok(Self {
            database,
            server,
            listener,
            shutdown: Shutdown::new(),
            logger,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Observe the server state.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.server.state()
    }

    /// Serve until SIGINT or SIGTERM, then shut down.
    pub async fn run_until_signal(self) -> Result<(), LifecycleError> {
        self.run_until(signals::wait_for_termination()).await
    }

    /// Serve until `signal` resolves, then shut down.
    pub async fn run_until<F>(self, signal: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = io::Result<Signal>>,
    {
        let Self {
            database,
            server,
            listener,
            shutdown,
            logger,
        } = self;

        let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

        let outcome = tokio::select! {
            received = signal => {
                let result = match received {
                    Ok(signal) => {
                        tracing::info!(
                            parent: &logger,
                            signal = %signal,
                            "Application termination request received, attempting graceful shutdown"
                        );
                        Ok(())
                    }
                    Err(e) => Err(LifecycleError::Signal(e)),
                };
                shutdown.trigger();
                let served = match (&mut server_task).await {
                    Ok(served) => served,
                    Err(e) => Err(ServerError::from(e)),
                };
                result.and(served.map_err(LifecycleError::from))
            }
            finished = &mut server_task => {
                let err = match finished {
                    Ok(Ok(())) => ServerError::UnexpectedStop,
                    Ok(Err(e)) => e,
                    Err(e) => ServerError::from(e),
                };
                tracing::error!(parent: &logger, error = %err, "Server stopped unexpectedly");
                Err(err.into())
            }
        };

        database.close().await;
        outcome
    }
}

fn http_server(logger: &Span) -> HttpServer {
    let discovery = DiscoveryController::new(component_span(logger, "discovery"));
    HttpServer::new(build_routes(discovery), ServerTimeouts::default())
}

async fn log_server_version(database: &Database, logger: &Span) {
    match database.server_version().await {
        Ok(version) => {
            tracing::info!(parent: logger, version = %version, "Database server version");
        }
        Err(e) => {
            tracing::warn!(
                parent: logger,
                error = %e,
                "Could not determine database server version"
            );
        }
    }
}
