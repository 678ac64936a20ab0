//! ingress-api: scrape endpoint for the ingress log exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Run one collection cycle and render it |
//! | GET | `/healthz` | Liveness, never touches the cluster |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use ingress_metrics::{IngressCollector, LatencySummary};

/// Shared state for the handlers.
#[derive(Clone)]
pub struct ApiState {
    pub collector: Arc<IngressCollector>,
    /// Extra summary rendered after the ingress family, if any.
    pub summary: Option<Arc<LatencySummary>>,
}

/// Build the exposition router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
