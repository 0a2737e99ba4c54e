//! SQLite implementation for record-access.
//!
//! Wraps an `sqlx::SqlitePool` and implements [`Connection`] with `?N`
//! placeholders. JSON values are stored as text and booleans as integers;
//! the accessor's schema turns them back on read.
//!
//! An in-memory database must use a single connection, since every SQLite
//! connection to `sqlite::memory:` opens its own database:
//!
//! ```text
//! let pool = SqlitePool::connect("sqlite::memory:", PoolConfig { max_connections: 1 }).await?;
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
pub use executor::SqlitePool;

// Re-export core types for convenience
pub use record_access::{
    AccessorConfig, Connect, Connection, ConnectionConfig, Order, PaginatedResult,
    PaginationRequest, PoolConfig, Record, RecordAccessor, ReturnFields, Row, Schema, Statement,
    StoreError, Value,
};
