//! Unit of Work trait

use async_trait::async_trait;
use cobro_errors::AppResult;

/// Explicit transaction control on a single connection
#[async_trait]
pub trait UnitOfWork: Send {
    /// Start a transaction
    async fn begin(&mut self) -> AppResult<()>;

    /// Commit the open transaction
    async fn commit(&mut self) -> AppResult<()>;

    /// Roll back the open transaction, a no-op when none is open
    async fn rollback(&mut self) -> AppResult<()>;
}
