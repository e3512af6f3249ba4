//! Startup, graceful shutdown and transport timeouts.

use std::time::{Duration, Instant};

use identity_api::http::{HttpServer, ServerError, ServerState, ServerTimeouts};
use identity_api::lifecycle::Shutdown;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

mod common;

fn timeouts() -> ServerTimeouts {
    ServerTimeouts {
        shutdown: Duration::from_secs(10),
        ..ServerTimeouts::default()
    }
}

#[tokio::test]
async fn test_state_transitions() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = HttpServer::new(common::discovery_routes(), timeouts());
    let mut state = server.state();
    assert_eq!(*state.borrow(), ServerState::Starting);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    state.wait_for(|s| *s == ServerState::Listening).await.unwrap();
    shutdown.trigger();
    handle.await.unwrap().unwrap();
    assert_eq!(*state.borrow(), ServerState::Stopped);
}

#[tokio::test]
async fn test_in_flight_request_completes_during_shutdown() {
    let routes = common::routes_with_slow_endpoint(Duration::from_millis(800));
    let mut server = common::start_server(routes, timeouts()).await;

    let slow_url = server.url("/slow");
    let in_flight = tokio::spawn(async move { common::client().get(slow_url).send().await });

    // Let the slow request reach the handler.
    while server.connections.active_count() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.shutdown.trigger();
    server.wait_for_state(ServerState::ShuttingDown).await;

    // The listener is gone: new connections are refused.
    let late = common::client().get(server.url("/api/v1/discovery")).send().await;
    assert!(late.is_err(), "request after shutdown should fail to connect");

    let res = in_flight.await.unwrap().expect("in-flight request should complete");
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "done");

    server.handle.await.unwrap().unwrap();
    assert_eq!(*server.state.borrow(), ServerState::Stopped);
    assert_eq!(server.connections.active_count(), 0);
}

#[tokio::test]
async fn test_shutdown_deadline_is_enforced() {
    let routes = common::routes_with_slow_endpoint(Duration::from_secs(3));
    let server = common::start_server(
        routes,
        ServerTimeouts {
            shutdown: Duration::from_millis(200),
            ..ServerTimeouts::default()
        },
    )
    .await;

    let slow_url = server.url("/slow");
    let in_flight = tokio::spawn(async move { common::client().get(slow_url).send().await });

    while server.connections.active_count() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(2), server.handle)
        .await
        .expect("shutdown should not wait for the slow request")
        .unwrap();

    match result {
        Err(ServerError::ShutdownTimeout { timeout, remaining }) => {
            assert_eq!(timeout, Duration::from_millis(200));
            assert_eq!(remaining, 1);
        }
        other => panic!("expected shutdown timeout, got {other:?}"),
    }

    assert!(in_flight.await.unwrap().is_err(), "aborted request should fail");
    assert_eq!(server.connections.active_count(), 0);
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let server = common::start_server(
        common::discovery_routes(),
        ServerTimeouts {
            idle: Duration::from_millis(200),
            ..timeouts()
        },
    )
    .await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let mut buf = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(3), stream.read_to_end(&mut buf)).await;
    assert!(closed.is_ok(), "idle connection should be closed by the server");

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_keep_alive_connection_serves_multiple_requests() {
    let server = common::start_server(common::discovery_routes(), timeouts()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let request = b"GET /api/v1/discovery HTTP/1.1\r\nHost: localhost\r\n\r\n";

    for _ in 0..2 {
        stream.write_all(request).await.unwrap();
        let mut buf = vec![0u8; 1024];
        let mut response = String::new();
        while !response.ends_with("Identity API is working...") {
            let n = stream.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed early");
            response.push_str(std::str::from_utf8(&buf[..n]).unwrap());
        }
        assert!(response.starts_with("HTTP/1.1 200 OK"));
    }
    assert_eq!(server.connections.active_count(), 1);

    drop(stream);
    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_stalled_request_head_is_cut_off() {
    let server = common::start_server(common::discovery_routes(), timeouts()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /api/v1/discovery HTTP/1.1\r\nHost: loc")
        .await
        .unwrap();

    let started = Instant::now();
    let mut buf = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut buf)).await;
    let elapsed = started.elapsed();

    assert!(closed.is_ok(), "stalled request head should be cut off");
    assert!(elapsed >= Duration::from_secs(4), "closed after only {elapsed:?}");
    assert!(!String::from_utf8_lossy(&buf).contains("200 OK"));

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_slow_response_hits_write_timeout() {
    let routes = common::routes_with_slow_endpoint(Duration::from_secs(2));
    let server = common::start_server(
        routes,
        ServerTimeouts {
            write: Duration::from_millis(200),
            ..timeouts()
        },
    )
    .await;

    let started = Instant::now();
    let res = common::client().get(server.url("/slow")).send().await.unwrap();
    assert_eq!(res.status(), 408);
    assert!(started.elapsed() < Duration::from_secs(2));

    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_http2_connection_is_served() {
    let server = common::start_server(common::discovery_routes(), timeouts()).await;

    let client = reqwest::Client::builder()
        .http2_prior_knowledge()
        .no_proxy()
        .build()
        .unwrap();
    let res = client.get(server.url("/api/v1/discovery")).send().await.unwrap();
    assert_eq!(res.version(), reqwest::Version::HTTP_2);
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "Identity API is working...");

    drop(client);
    server.shutdown.trigger();
    server.handle.await.unwrap().unwrap();
}
