//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Wrap the route table with middleware (tracing, request ID, write timeout)
//! - Configure HTTP/1.1 and HTTP/2 connections with read and idle timeouts
//! - Run the accept loop until shutdown is signalled
//! - Drain in-flight connections within the shutdown deadline
//!
//! # States
//! ```text
//! Starting → Listening → ShuttingDown → Stopped
//! ```

use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::{conn::auto::Builder, graceful::GracefulShutdown},
    service::TowerToHyperService,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::lifecycle::shutdown::SHUTDOWN_TIMEOUT;
use crate::net::{ConnectionTracker, IdleTimeout, ListenerError};

/// Connections with no traffic for this long are closed.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for a client to send the request head (HTTP/1), and for an
/// HTTP/2 peer to acknowledge a keep-alive ping.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for producing a response.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the per-request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Transport timeouts and the shutdown deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeouts {
    pub idle: Duration,
    pub read: Duration,
    pub write: Duration,
    pub shutdown: Duration,
}

impl Default for ServerTimeouts {
    fn default() -> Self {
        Self {
            idle: IDLE_TIMEOUT,
            read: READ_TIMEOUT,
            write: WRITE_TIMEOUT,
            shutdown: SHUTDOWN_TIMEOUT,
        }
    }
}

/// Lifecycle state of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Starting,
    Listening,
    ShuttingDown,
    Stopped,
}

/// Server startup, serving and shutdown errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] std::io::Error),

    #[error("graceful shutdown exceeded {timeout:?}, {remaining} connection(s) closed forcibly")]
    ShutdownTimeout { timeout: Duration, remaining: u64 },

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("server stopped before a shutdown was requested")]
    UnexpectedStop,
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    timeouts: ServerTimeouts,
    state: watch::Sender<ServerState>,
    connections: ConnectionTracker,
}

impl HttpServer {
    /// Create a server around a finished route table.
    pub fn new(routes: Router, timeouts: ServerTimeouts) -> Self {
        let router = Self::build_router(routes, &timeouts);
        let (state, _) = watch::channel(ServerState::Starting);
        Self {
            router,
            timeouts,
            state,
            connections: ConnectionTracker::new(),
        }
    }

    /// Wrap the routes with all middleware layers.
    #[allow(deprecated)]
    fn build_router(routes: Router, timeouts: &ServerTimeouts) -> Router {
        routes
            .layer(TimeoutLayer::new(timeouts.write))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Handle to the active connection count.
    pub fn connections(&self) -> ConnectionTracker {
        self.connections.clone()
    }

    /// Serve `listener` until `shutdown` fires, then drain.
    ///
    /// New connections are refused as soon as shutdown starts because the
    /// listener is dropped. Connections still open when the deadline elapses
    /// are aborted and reported through [`ServerError::ShutdownTimeout`].
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

        let mut builder = Builder::new(TokioExecutor::new());
        builder
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.timeouts.read);
        // HTTP/2 has no header read timeout: a peer that stops answering
        // pings within the read timeout is dropped instead.
        builder
            .http2()
            .timer(TokioTimer::new())
            .keep_alive_interval(self.timeouts.idle)
            .keep_alive_timeout(self.timeouts.read);

        let graceful = GracefulShutdown::new();
        let mut tasks = JoinSet::new();

        self.state.send_replace(ServerState::Listening);
        tracing::info!(address = %addr, port = addr.port(), "Server started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let guard = self.connections.track();
                    let span = tracing::debug_span!("connection", id = %guard.id(), peer = %peer);
                    let io = TokioIo::new(IdleTimeout::new(stream, self.timeouts.idle));
                    let service = TowerToHyperService::new(self.router.clone());
                    let conn = graceful.watch(builder.serve_connection(io, service).into_owned());

                    tasks.spawn(
                        async move {
                            if let Err(e) = conn.await {
                                tracing::debug!(error = %e, "Connection ended with error");
                            }
                            drop(guard);
                        }
                        .instrument(span),
                    );
                }
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        self.state.send_replace(ServerState::ShuttingDown);
        tracing::info!(
            address = %addr,
            active_connections = self.connections.active_count(),
            timeout = ?self.timeouts.shutdown,
            "Listener closed, draining connections"
        );

        let result = match tokio::time::timeout(self.timeouts.shutdown, graceful.shutdown()).await {
            Ok(()) => {
                tracing::info!("All connections drained");
                Ok(())
            }
            Err(_) => {
                let remaining = self.connections.active_count();
                tracing::warn!(
                    remaining,
                    "Shutdown deadline elapsed, closing remaining connections"
                );
                tasks.abort_all();
                Err(ServerError::ShutdownTimeout {
                    timeout: self.timeouts.shutdown,
                    remaining,
                })
            }
        };

        while tasks.join_next().await.is_some() {}

        self.state.send_replace(ServerState::Stopped);
        tracing::info!("HTTP server stopped");
        result
    }
}
