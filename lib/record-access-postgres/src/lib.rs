//! PostgreSQL implementation for record-access.
//!
//! Wraps an `sqlx::PgPool` and implements [`Connection`], binding statement
//! values as `$N` parameters and decoding rows into JSON maps keyed by column
//! name.
//!
//! # Usage
//!
//! ```text
//! use record_access_postgres::{Connect, PgPool, PoolConfig, RecordAccessor};
//!
//! let pool = PgPool::connect("postgres://localhost/app", PoolConfig::default()).await?;
//! let users: RecordAccessor<_, User> = RecordAccessor::for_record(pool)?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod error;
mod executor;

pub use bind::{bind_params, row_to_json};
pub use error::map_sqlx_error;
pub use executor::PgPool;

// Re-export core types for convenience
pub use record_access::{
    AccessorConfig, Connect, Connection, ConnectionConfig, Order, PaginatedResult,
    PaginationRequest, PoolConfig, Record, RecordAccessor, ReturnFields, Row, Schema, Statement,
    StoreError, Value,
};
