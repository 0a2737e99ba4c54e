//! PostgreSQL implementation of Connection.

use async_trait::async_trait;
use record_access::{
    Connect, Connection, ConnectionConfig, Dialect, PoolConfig, Row, SqlStatement, StoreError,
};
use sqlx::postgres::PgPoolOptions;
use std::ops::Deref;
use tracing::debug;

use crate::{bind_params, map_sqlx_error, row_to_json};

/// Wrapper around sqlx::PgPool that implements Connection.
#[derive(Clone, Debug)]
pub struct PgPool(sqlx::PgPool);

impl PgPool {
    /// Create a new PgPool from an sqlx PgPool.
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self(pool)
    }

    /// Get the inner sqlx::PgPool.
    pub fn inner(&self) -> &sqlx::PgPool {
        &self.0
    }
}

impl Deref for PgPool {
    type Target = sqlx::PgPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl Connection for PgPool {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
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
impl Connect for PgPool {
    async fn connect(
        config: impl Into<ConnectionConfig> + Send,
        pool: PoolConfig,
    ) -> Result<Self, StoreError> {
        let ConnectionConfig::Url(url) = config.into();
        debug!(max_connections = pool.max_connections, "connecting to postgres");

        let pool = PgPoolOptions::new()
            .max_connections(pool.max_connections)
            .connect(&url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self(pool))
    }
}
