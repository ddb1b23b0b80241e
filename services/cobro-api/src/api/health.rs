//! Liveness and readiness

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: Vec<ServiceCheck>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceCheck {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Opens a connection and pings it; 503 when either step fails
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let check = match state.connect().await {
        Ok(mut conn) => {
            let ping = conn.ping().await;
            conn.close().await;
            match ping {
                Ok(()) => ServiceCheck {
                    name: "database".to_string(),
                    healthy: true,
                    message: None,
                },
                Err(e) => ServiceCheck {
                    name: "database".to_string(),
                    healthy: false,
                    message: Some(e.message().to_string()),
                },
            }
        }
        Err(e) => ServiceCheck {
            name: "database".to_string(),
            healthy: false,
            message: Some(e.message().to_string()),
        },
    };

    let ready = check.healthy;
    if !ready {
        warn!(message = ?check.message, "Readiness check failed");
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            ready,
            checks: vec![check],
        }),
    )
}
