//! Payment notification intake

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use cobro_domain::{PaymentNotification, INVALID_BODY};
use cobro_errors::{AppError, AppResult};
use cobro_ports::BillingConnection;
use cobro_telemetry::names::{DB_ERRORS_TOTAL, HTTP_REQUESTS_TOTAL, PAYMENTS_RECORDED_TOTAL};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use super::origin::OriginAddr;
use super::UNEXPECTED_ERROR;
use crate::state::AppState;

pub const PAYMENT_RECORDED: &str = "Notificación de pago registrada exitosamente.";
pub const DB_ERROR_PAYMENT: &str = "Error en la base de datos al registrar pago";

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentRecorded {
    pub message: String,
    pub id_transaccion: Option<i64>,
}

/// `POST /api/notificar_pago`
pub async fn notificar_pago(
    State(state): State<AppState>,
    OriginAddr(origin_ip): OriginAddr,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PaymentRecorded>)> {
    counter!(HTTP_REQUESTS_TOTAL, "endpoint" => "notificar_pago").increment(1);

    let notification = body
        .map_err(|rejection| {
            warn!(error = %rejection.body_text(), "Unreadable payment notification body");
            AppError::validation(INVALID_BODY)
        })
        .and_then(|Json(body)| PaymentNotification::from_json(&body))
        .inspect_err(|e| warn!(error = %e, "Rejected payment notification"))?
        .with_origin_ip(origin_ip);

    let mut conn = state.connect().await?;
    let result = record(&mut *conn, &notification).await;
    if result.is_err() {
        if let Err(e) = conn.rollback().await {
            warn!(error = %e, "Rollback failed");
        }
    }
    conn.close().await;

    match result {
        Ok(id) => {
            info!(
                referencia_cliente = %notification.client_reference,
                id_transaccion = ?id,
                origin_ip = ?notification.origin_ip,
                "Payment notification recorded"
            );
            counter!(PAYMENTS_RECORDED_TOTAL).increment(1);
            Ok((
                StatusCode::CREATED,
                Json(PaymentRecorded {
                    message: PAYMENT_RECORDED.to_string(),
                    id_transaccion: id,
                }),
            ))
        }
        Err(AppError::Database(msg)) => {
            error!(
                referencia_cliente = %notification.client_reference,
                error = %msg,
                "Failed to record payment notification"
            );
            counter!(DB_ERRORS_TOTAL, "endpoint" => "notificar_pago").increment(1);
            Err(AppError::database(format!("{}: {}", DB_ERROR_PAYMENT, msg)))
        }
        Err(e) => {
            error!(error = %e, "Unexpected error while recording payment notification");
            Err(AppError::internal(UNEXPECTED_ERROR))
        }
    }
}

/// Single-row insert inside its own transaction
async fn record<C>(conn: &mut C, notification: &PaymentNotification) -> AppResult<Option<i64>>
where
    C: BillingConnection + ?Sized,
{
    conn.begin().await?;
    let id = conn.insert_payment(notification).await?;
    conn.commit().await?;
    Ok(id)
}
