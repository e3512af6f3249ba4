//! Route table and dispatch.
//!
//! # Responsibilities
//! - Register the versioned discovery path
//! - Leave unmatched paths to axum's default 404
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards
//! - Exact path match; any method is accepted

use axum::{routing::any, Router};

use crate::http::discovery::{discovery, DiscoveryController};

/// API version segment.
pub const API_VERSION: &str = "v1";

/// Discovery endpoint name, relative to the API prefix.
pub const DISCOVERY_ENDPOINT: &str = "/discovery";

/// Versioned prefix every endpoint is mounted under, e.g. `/api/v1`.
pub fn api_prefix() -> String {
    format!("/api/{}", API_VERSION)
}

/// Full path of an endpoint under the API prefix.
pub fn endpoint_path(endpoint: &str) -> String {
    format!("{}{}", api_prefix(), endpoint)
}

/// Build the dispatch table.
pub fn build_routes(discovery_controller: DiscoveryController) -> Router {
    let discovery_path = endpoint_path(DISCOVERY_ENDPOINT);
    tracing::debug!(path = %discovery_path, "Registering route");

    Router::new()
        .route(&discovery_path, any(discovery))
        .with_state(discovery_controller)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;
    use tracing::{Event, Span, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use crate::http::discovery::DISCOVERY_MESSAGE;

    /// Counts events emitted by the discovery module.
    #[derive(Clone, Default)]
    struct DiscoveryEvents(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for DiscoveryEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() == "identity_api::http::discovery" {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    async fn call(
        router: Router,
        method: Method,
        uri: &str,
        body: &'static str,
    ) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_discovery_path() {
        assert_eq!(api_prefix(), "/api/v1");
        assert_eq!(endpoint_path(DISCOVERY_ENDPOINT), "/api/v1/discovery");
    }

    #[tokio::test]
    async fn test_any_method_gets_message() {
        let router = build_routes(DiscoveryController::new(Span::none()));
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let (status, body) = call(router.clone(), method, "/api/v1/discovery", "ignored").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, DISCOVERY_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_unregistered_paths_are_not_found() {
        let router = build_routes(DiscoveryController::new(Span::none()));
        for uri in ["/", "/api/v1", "/api/v2/discovery", "/api/v1/discovery/extra"] {
            let (status, _) = call(router.clone(), Method::GET, uri, "").await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_concurrent_requests_log_once_each() {
        let events = DiscoveryEvents::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let router = build_routes(DiscoveryController::new(tracing::info_span!("test")));
        let (first, second) = tokio::join!(
            call(router.clone(), Method::GET, "/api/v1/discovery", ""),
            call(router.clone(), Method::GET, "/api/v1/discovery", ""),
        );

        assert_eq!(first, (StatusCode::OK, DISCOVERY_MESSAGE.to_string()));
        assert_eq!(second, (StatusCode::OK, DISCOVERY_MESSAGE.to_string()));
        assert_eq!(events.0.load(Ordering::SeqCst), 2);
    }
}
