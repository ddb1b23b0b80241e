//! Service starter
//!
//! Shared entry point: configuration, logging, database provider, HTTP
//! server and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use cobro_adapter_postgres::{create_provider, PostgresConfig};
use cobro_config::AppConfig;
use cobro_ports::ConnectionProvider;
use cobro_telemetry::init_metrics;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::info;

use crate::runtime::{init_runtime, shutdown_signal};

/// Everything a service needs to build its router
#[derive(Clone)]
pub struct ServiceContext {
    pub config: AppConfig,
    pub provider: Arc<dyn ConnectionProvider>,
    /// Present when `telemetry.metrics_enabled` is set
    pub metrics: Option<PrometheusHandle>,
}

/// Run an HTTP service
///
/// 1. Load `.env` and configuration
/// 2. Initialize logging
/// 3. Install the Prometheus recorder if enabled
/// 4. Create the database connection provider
/// 5. Build the router and serve until a shutdown signal arrives
///
/// # Example
///
/// ```ignore
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     cobro_bootstrap::run("config", |ctx| build_router(ctx)).await
/// }
/// ```
pub async fn run<F>(config_dir: &str, build_router: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(ServiceContext) -> Router,
{
    dotenvy::dotenv().ok();

    let config = AppConfig::load(config_dir)?;

    init_runtime(&config);

    info!("Starting {} service", config.app_name);

    let metrics = if config.telemetry.metrics_enabled {
        Some(init_metrics()?)
    } else {
        None
    };

    let pg_config =
        PostgresConfig::from(&config.database).with_application_name(config.app_name.clone());
    info!(
        locator = %pg_config.locator(),
        pooled = pg_config.pool_max.is_some(),
        "Database configured"
    );
    let provider = create_provider(&pg_config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let app = build_router(ServiceContext {
        config,
        provider,
        metrics,
    });

    info!(%addr, "HTTP server starting");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Service stopped");

    Ok(())
}
