//! cobro-telemetry - logging and metrics setup

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing with the human-readable formatter
///
/// `RUST_LOG` takes precedence over `log_level`.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize tracing with the JSON formatter (production)
pub fn init_tracing_json(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names emitted by the API
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "cobro_http_requests_total";
    pub const DB_CONNECT_FAILURES_TOTAL: &str = "cobro_db_connect_failures_total";
    pub const DB_ERRORS_TOTAL: &str = "cobro_db_errors_total";
    pub const INVOICES_RETURNED_TOTAL: &str = "cobro_invoices_returned_total";
    pub const PAYMENTS_RECORDED_TOTAL: &str = "cobro_payments_recorded_total";
}
