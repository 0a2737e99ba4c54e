//! SQLite implementation of Connection.

use async_trait::async_trait;
use record_access::{
    Connect, Connection, ConnectionConfig, Dialect, PoolConfig, Row, SqlStatement, StoreError,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::ops::Deref;
use std::str::FromStr;
use tracing::debug;

use crate::{bind_params, map_sqlx_error, row_to_json};

/// Wrapper around sqlx::SqlitePool that implements Connection.
#[derive(Clone, Debug)]
pub struct SqlitePool(sqlx::SqlitePool);

impl SqlitePool {
    /// Create a new SqlitePool from an sqlx SqlitePool.
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self(pool)
    }

    /// Get the inner sqlx::SqlitePool.
    pub fn inner(&self) -> &sqlx::SqlitePool {
        &self.0
    }
}

impl Deref for SqlitePool {
    type Target = sqlx::SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl Connection for SqlitePool {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_all(&self, statement: &SqlStatement) -> Result<Vec<Row>, StoreError> {
        let args = bind_params(&statement.params)?;
        let rows = sqlx::query_with(&statement.sql, args)
            .fetch_all(&self.0)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_json).collect()
    }

    async fn execute(&self, statement: &SqlStatement) -> Result<u64, StoreError> {
        let args = bind_params(&statement.params)?;
        let result = sqlx::query_with(&statement.sql, args)
            .execute(&self.0)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Connect for SqlitePool {
    async fn connect(
        config: impl Into<ConnectionConfig> + Send,
        pool: PoolConfig,
    ) -> Result<Self, StoreError> {
        let ConnectionConfig::Url(url) = config.into();
        debug!(max_connections = pool.max_connections, "opening sqlite pool");

        let options = SqliteConnectOptions::from_str(&url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Idle connections are never reaped, so an in-memory database lives
        // as long as the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(pool.max_connections)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self(pool))
    }
}
