//! The store boundary: a connection that runs parameterized SQL.

use async_trait::async_trait;

use crate::{ConnectionConfig, Dialect, PoolConfig, SqlStatement, StoreError};

/// A result row keyed by the store's native column names.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Trait for executing SQL against a database backend.
///
/// Implemented by database-specific pool wrappers. Implementations are cheap
/// to clone and shared by every accessor built on them.
#[async_trait]
pub trait Connection: Clone + Send + Sync {
    /// Placeholder syntax this backend expects.
    fn dialect(&self) -> Dialect;

    /// Run a statement that yields rows (`SELECT`, `... RETURNING`).
    async fn fetch_all(&self, statement: &SqlStatement) -> Result<Vec<Row>, StoreError>;

    /// Run a statement and return the number of rows affected.
    async fn execute(&self, statement: &SqlStatement) -> Result<u64, StoreError>;
}

/// Trait for opening a backend connection pool.
#[async_trait]
pub trait Connect: Connection + Sized {
    /// Connect using the provided configuration.
    async fn connect(
        config: impl Into<ConnectionConfig> + Send,
        pool: PoolConfig,
    ) -> Result<Self, StoreError>;
}
