//! Shared handler state

use std::sync::Arc;

use cobro_errors::{AppError, AppResult};
use cobro_ports::{BillingConnection, ConnectionProvider};
use cobro_telemetry::names::DB_CONNECT_FAILURES_TOTAL;
use metrics::counter;

pub const DB_UNAVAILABLE: &str = "No se pudo conectar a la base de datos.";

/// Immutable across requests; each request opens its own connection
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn ConnectionProvider>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { provider }
    }

    /// Open a connection for the current request
    pub async fn connect(&self) -> AppResult<Box<dyn BillingConnection>> {
        match self.provider.connect().await {
            Some(conn) => Ok(conn),
            None => {
                counter!(DB_CONNECT_FAILURES_TOTAL).increment(1);
                Err(AppError::unavailable(DB_UNAVAILABLE))
            }
        }
    }
}
