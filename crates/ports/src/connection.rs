//! Connection provider and per-request connection

use async_trait::async_trait;
use cobro_domain::{CustomerId, Invoice, PaymentNotification};
use cobro_errors::AppResult;

use crate::UnitOfWork;

/// Hands out one database connection per request
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// `None` when the database cannot be reached
    ///
    /// Implementations log the cause; callers only see that no connection is
    /// available.
    async fn connect(&self) -> Option<Box<dyn BillingConnection>>;
}

/// Operations available on an open connection
///
/// Errors carry the driver's message text.
#[async_trait]
pub trait BillingConnection: UnitOfWork {
    /// Pending invoices for a customer, ordered by invoice number
    async fn fetch_invoices(&mut self, customer: &CustomerId) -> AppResult<Vec<Invoice>>;

    /// Insert one payment transaction row, returning its key if the
    /// database reports one
    async fn insert_payment(&mut self, notification: &PaymentNotification)
    -> AppResult<Option<i64>>;

    /// Round trip to check the connection is usable
    async fn ping(&mut self) -> AppResult<()>;

    /// Release the connection
    async fn close(self: Box<Self>);
}
