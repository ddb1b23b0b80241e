//! Pending invoice lookup

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use cobro_domain::{CustomerId, Invoice, MISSING_CUSTOMER_ID};
use cobro_errors::{AppError, AppResult};
use cobro_telemetry::names::{DB_ERRORS_TOTAL, HTTP_REQUESTS_TOTAL, INVOICES_RETURNED_TOTAL};
use metrics::counter;
use tracing::{error, info, warn};

use super::UNEXPECTED_ERROR;
use crate::state::AppState;

pub const DB_ERROR_INVOICES: &str = "Error en la base de datos al consultar facturas";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FacturasQuery {
    pub tipo_id: Option<String>,
    pub num_id: Option<String>,
}

impl FacturasQuery {
    /// The first occurrence of a repeated key wins
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "tipo_id" => &mut query.tipo_id,
                "num_id" => &mut query.num_id,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// `GET /api/facturas?tipo_id=..&num_id=..`
pub async fn get_facturas(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> AppResult<Json<Vec<Invoice>>> {
    counter!(HTTP_REQUESTS_TOTAL, "endpoint" => "facturas").increment(1);

    let customer = query
        .map_err(|rejection| {
            warn!(error = %rejection.body_text(), "Unreadable invoice query string");
            AppError::validation(MISSING_CUSTOMER_ID)
        })
        .and_then(|Query(pairs)| {
            let params = FacturasQuery::from_pairs(pairs);
            CustomerId::from_params(params.tipo_id.as_deref(), params.num_id.as_deref())
        })
        .inspect_err(|e| warn!(error = %e, "Rejected invoice query"))?;

    let mut conn = state.connect().await?;
    let result = conn.fetch_invoices(&customer).await;
    conn.close().await;

    match result {
        Ok(invoices) => {
            info!(
                tipo_id = %customer.id_type,
                count = invoices.len(),
                "Invoices fetched"
            );
            counter!(INVOICES_RETURNED_TOTAL).increment(invoices.len() as u64);
            Ok(Json(invoices))
        }
        Err(AppError::Database(msg)) => {
            error!(error = %msg, "Invoice query failed");
            counter!(DB_ERRORS_TOTAL, "endpoint" => "facturas").increment(1);
            Err(AppError::database(format!("{}: {}", DB_ERROR_INVOICES, msg)))
        }
        Err(e) => {
            error!(error = %e, "Unexpected error while fetching invoices");
            Err(AppError::internal(UNEXPECTED_ERROR))
        }
    }
}
