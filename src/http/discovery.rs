//! Discovery endpoint.
//!
//! Answers every request with a fixed confirmation string so operators and
//! load balancers can tell the service is up.

use axum::extract::State;
use tracing::Span;

/// Body returned by the discovery endpoint.
pub const DISCOVERY_MESSAGE: &str = "Identity API is working...";

/// Stateless controller behind `/api/v1/discovery`.
///
/// Holds only the logger it was constructed with, so clones are cheap and
/// concurrent invocations share nothing mutable.
#[derive(Debug, Clone)]
pub struct DiscoveryController {
    logger: Span,
}

impl DiscoveryController {
    pub fn new(logger: Span) -> Self {
        Self { logger }
    }

    /// Log the request and return the confirmation body.
    pub fn serve(&self) -> &'static str {
        tracing::info!(
            parent: &self.logger,
            handler = "discovery",
            "Request served for discovery controller"
        );
        DISCOVERY_MESSAGE
    }
}

/// Axum handler. Method, headers and body are ignored.
pub async fn discovery(State(controller): State<DiscoveryController>) -> &'static str {
    controller.serve()
}
