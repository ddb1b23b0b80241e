//! PostgreSQL connection management

use std::sync::Arc;

use async_trait::async_trait;
use cobro_domain::{CustomerId, Invoice, PaymentNotification};
use cobro_errors::{AppError, AppResult};
use cobro_ports::{BillingConnection, ConnectionProvider, UnitOfWork};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::{Connection, Executor, Postgres};
use tracing::{debug, error, warn};

use crate::config::PostgresConfig;
use crate::queries::{insert_payment_sql, InvoiceRow, SELECT_PENDING_INVOICES};

/// Driver error text, without sqlx's own prefix
pub fn db_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

fn database_error(err: sqlx::Error) -> AppError {
    AppError::database(db_message(&err))
}

/// Create a provider for the configured strategy
pub fn create_provider(config: &PostgresConfig) -> Arc<dyn ConnectionProvider> {
    match config.pool_max {
        Some(_) => Arc::new(PooledConnectionProvider::new(config.clone())),
        None => Arc::new(DirectConnectionProvider::new(config.clone())),
    }
}

/// Opens a fresh connection for every request
pub struct DirectConnectionProvider {
    config: PostgresConfig,
    insert_sql: Arc<str>,
}

impl DirectConnectionProvider {
    pub fn new(config: PostgresConfig) -> Self {
        let insert_sql = insert_payment_sql(&config.id_strategy).into();
        Self { config, insert_sql }
    }
}

#[async_trait]
impl ConnectionProvider for DirectConnectionProvider {
    async fn connect(&self) -> Option<Box<dyn BillingConnection>> {
        match PgConnection::connect_with(&self.config.connect_options()).await {
            Ok(conn) => {
                debug!(locator = %self.config.locator(), "Database connection opened");
                Some(Box::new(PgBillingConnection::new(
                    Handle::Direct(conn),
                    self.insert_sql.clone(),
                )))
            }
            Err(e) => {
                error!(
                    locator = %self.config.locator(),
                    error = %db_message(&e),
                    "Failed to connect to database"
                );
                None
            }
        }
    }
}

/// Hands out connections from a bounded pool
pub struct PooledConnectionProvider {
    pool: PgPool,
    locator: String,
    insert_sql: Arc<str>,
}

impl PooledConnectionProvider {
    /// Connections are opened lazily, on first use
    pub fn new(config: PostgresConfig) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max.unwrap_or(1))
            .min_connections(0)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(config.connect_options());

        Self {
            pool,
            locator: config.locator(),
            insert_sql: insert_payment_sql(&config.id_strategy).into(),
        }
    }
}

#[async_trait]
impl ConnectionProvider for PooledConnectionProvider {
    async fn connect(&self) -> Option<Box<dyn BillingConnection>> {
        match self.pool.acquire().await {
            Ok(conn) => Some(Box::new(PgBillingConnection::new(
                Handle::Pooled(conn),
                self.insert_sql.clone(),
            ))),
            Err(e) => {
                error!(
                    locator = %self.locator,
                    error = %db_message(&e),
                    "Failed to acquire database connection"
                );
                None
            }
        }
    }
}

enum Handle {
    Direct(PgConnection),
    Pooled(PoolConnection<Postgres>),
}

impl Handle {
    fn conn(&mut self) -> &mut PgConnection {
        match self {
            Handle::Direct(conn) => conn,
            Handle::Pooled(conn) => &mut **conn,
        }
    }
}

/// One request's connection
pub struct PgBillingConnection {
    handle: Handle,
    insert_sql: Arc<str>,
    in_transaction: bool,
}

impl PgBillingConnection {
    fn new(handle: Handle, insert_sql: Arc<str>) -> Self {
        Self {
            handle,
            insert_sql,
            in_transaction: false,
        }
    }
}

#[async_trait]
impl UnitOfWork for PgBillingConnection {
    async fn begin(&mut self) -> AppResult<()> {
        if self.in_transaction {
            return Err(AppError::internal("Transaction already open"));
        }
        self.handle
            .conn()
            .execute("BEGIN")
            .await
            .map_err(database_error)?;
        self.in_transaction = true;
        Ok(())
    }

    async fn commit(&mut self) -> AppResult<()> {
        if !self.in_transaction {
            return Err(AppError::internal("No open transaction to commit"));
        }
        // A failed COMMIT ends the transaction server-side as well
        self.in_transaction = false;
        self.handle
            .conn()
            .execute("COMMIT")
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn rollback(&mut self) -> AppResult<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.handle
            .conn()
            .execute("ROLLBACK")
            .await
            .map_err(database_error)?;
        self.in_transaction = false;
        Ok(())
    }
}

#[async_trait]
impl BillingConnection for PgBillingConnection {
    async fn fetch_invoices(&mut self, customer: &CustomerId) -> AppResult<Vec<Invoice>> {
        sqlx::query_as::<_, InvoiceRow>(SELECT_PENDING_INVOICES)
            .bind(&customer.id_type)
            .bind(&customer.id_number)
            .fetch_all(self.handle.conn())
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(database_error)
    }

    async fn insert_payment(
        &mut self,
        notification: &PaymentNotification,
    ) -> AppResult<Option<i64>> {
        let id = sqlx::query_scalar::<_, Option<i64>>(&self.insert_sql)
            .bind(&notification.client_reference)
            .bind(notification.amount)
            .bind(&notification.currency)
            .bind(&notification.status)
            .bind(notification.transaction_at)
            .bind(&notification.received_signature)
            .bind(&notification.signature_valid)
            .bind(&notification.raw_payload)
            .bind(&notification.origin_ip)
            .bind(&notification.processed)
            .bind(&notification.error_message)
            .fetch_optional(self.handle.conn())
            .await
            .map_err(database_error)?;

        Ok(id.flatten())
    }

    async fn ping(&mut self) -> AppResult<()> {
        self.handle
            .conn()
            .ping()
            .await
            .map_err(database_error)
    }

    async fn close(self: Box<Self>) {
        let PgBillingConnection {
            handle,
            in_transaction,
            ..
        } = *self;

        let result = match handle {
            Handle::Direct(conn) => conn.close().await,
            // Never hand a connection with an open transaction back to the pool
            Handle::Pooled(conn) if in_transaction => conn.detach().close().await,
            Handle::Pooled(conn) => {
                drop(conn);
                Ok(())
            }
        };

        match result {
            Ok(()) => debug!("Database connection released"),
            Err(e) => warn!(error = %db_message(&e), "Error while closing database connection"),
        }
    }
}
