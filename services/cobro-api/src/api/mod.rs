//! HTTP routes

mod facturas;
mod health;
mod origin;
mod pagos;
mod prometheus;

use std::any::Any;

use axum::{
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use cobro_bootstrap::ServiceContext;
use cobro_errors::AppError;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::state::AppState;

pub use facturas::{get_facturas, FacturasQuery, DB_ERROR_INVOICES};
pub use health::{HealthResponse, ReadinessResponse, ServiceCheck};
pub use origin::OriginAddr;
pub use pagos::{notificar_pago, PaymentRecorded, DB_ERROR_PAYMENT, PAYMENT_RECORDED};

pub const UNEXPECTED_ERROR: &str = "Error inesperado al procesar la solicitud.";

/// Business endpoints
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/facturas", get(get_facturas))
        .route("/api/notificar_pago", post(notificar_pago))
}

/// Liveness and readiness
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
}

/// Routes and per-request error handling, without transport layers
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(api_routes())
        .merge(health_routes())
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
}

/// Full router used by the binary
pub fn build_router(ctx: ServiceContext) -> Router {
    let server = &ctx.config.server;

    let mut router = app(AppState::new(ctx.provider.clone()));

    if let Some(handle) = ctx.metrics.clone() {
        router = router.merge(prometheus::metrics_routes(handle));
    }

    router = router
        .layer(RequestBodyLimitLayer::new(server.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors_layer(&server.cors_allowed_origins) {
        router = router.layer(cors);
    }

    router
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(AnyOrigin)
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Request handler panicked");

    AppError::internal(UNEXPECTED_ERROR).into_response()
}
