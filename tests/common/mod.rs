//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::get, Router};
use identity_api::http::{DiscoveryController, HttpServer, ServerError, ServerState, ServerTimeouts};
use identity_api::lifecycle::Shutdown;
use identity_api::net::ConnectionTracker;
use identity_api::routing::build_routes;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Span;

/// A server running on an ephemeral port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub state: watch::Receiver<ServerState>,
    pub connections: ConnectionTracker,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the server reaches `target`.
    pub async fn wait_for_state(&mut self, target: ServerState) {
        tokio::time::timeout(Duration::from_secs(5), self.state.wait_for(|s| *s == target))
            .await
            .expect("state change timed out")
            .expect("server dropped its state channel");
    }
}

/// Start `routes` behind the production middleware on 127.0.0.1:0.
pub async fn start_server(routes: Router, timeouts: ServerTimeouts) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(routes, timeouts);
    let state = server.state();
    let connections = server.connections();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let mut test_server = TestServer {
        addr,
        shutdown,
        state,
        connections,
        handle,
    };
    test_server.wait_for_state(ServerState::Listening).await;
    test_server
}

/// The production route table.
pub fn discovery_routes() -> Router {
    build_routes(DiscoveryController::new(Span::none()))
}

/// Production routes plus `/slow`, which answers after `delay`.
#[allow(dead_code)]
pub fn routes_with_slow_endpoint(delay: Duration) -> Router {
    discovery_routes().route(
        "/slow",
        get(move || async move {
            tokio::time::sleep(delay).await;
            "done"
        }),
    )
}

/// Client that opens a fresh connection per request.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
