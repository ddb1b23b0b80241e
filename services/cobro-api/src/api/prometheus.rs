//! Prometheus exposition

use axum::{extract::State, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;

pub fn metrics_routes(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(handle)
}

async fn render_metrics(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
