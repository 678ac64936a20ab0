//! Exposition handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use tracing::warn;

use ingress_metrics::prometheus::CONTENT_TYPE as PROMETHEUS_TEXT;
use ingress_metrics::render_report;

use crate::ApiState;

/// GET /metrics
///
/// A failed discovery answers 503 instead of an empty or zeroed family,
/// so the scraper records a failed scrape rather than zero traffic.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    match state.collector.collect().await {
        Ok(report) => {
            let mut body = render_report(&report);
            if let Some(summary) = &state.summary {
                body.push_str(&summary.render());
            }
            (StatusCode::OK, [(CONTENT_TYPE, PROMETHEUS_TEXT)], body).into_response()
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "scrape failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("scrape failed: {e}\n"),
            )
                .into_response()
        }
    }
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok\n")
}
