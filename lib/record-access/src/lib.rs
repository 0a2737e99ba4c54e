//! Record Access - generic, allowlisted CRUD over a relational table.
//!
//! This crate builds parameterized SQL for create/update/upsert/get/list/
//! find/delete/paginate on an arbitrary table and runs it through a
//! backend [`Connection`].
//!
//! # Core Concepts
//!
//! - **Statement**: a field name to value map, used as a write payload or as
//!   an AND-of-equalities filter. Keys are camelCase at the call boundary and
//!   snake_case in the store.
//! - **Schema**: the table plus its column allowlist. Every field name is
//!   checked against it before reaching SQL; values are always bound.
//! - **Return fields**: the columns every `SELECT`/`RETURNING` yields, fixed
//!   per accessor.
//!
//! # Example
//!
//! ```text
//! let users: RecordAccessor<_, User> = RecordAccessor::for_record(pool)?;
//! let ada = users.create(&Statement::new().set("email", "ada@example.com")).await?;
//! let page = users.paginate(&PaginationRequest::new(1, 20)).await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod accessor;
mod config;
mod error;
mod executor;
mod pagination;
mod query;
mod schema;
mod statement;
mod time;
mod value;

pub use accessor::{AccessorContext, RecordAccessor};
pub use config::{
    AccessorConfig, ColumnConfig, ConnectionConfig, DEFAULT_MAX_CONNECTIONS, PoolConfig,
};
pub use error::StoreError;
pub use executor::{Connect, Connection, Row};
pub use pagination::{PaginatedResult, PaginationRequest};
pub use query::{ColumnValues, Dialect, Order, OrderBy, QueryBuilder, SqlStatement};
pub use schema::{
    CREATED_AT_COLUMN, Column, ColumnKind, ID_COLUMN, Record, ReturnFields, Schema,
    UPDATED_AT_COLUMN,
};
pub use statement::Statement;
pub use time::now_millis;
pub use value::{Param, Value};

// Re-export derive macro
pub use record_access_derive::Record;
