//! The generic record accessor.
//!
//! A [`RecordAccessor`] is configured once with a connection, a schema and
//! the return fields, and offers create/update/upsert/get/list/find/del and
//! paginate over that table.
//!
//! - Write paths stamp `updated_at` with the current epoch milliseconds;
//!   `create` and `upsert` also stamp `created_at` unless the caller gave one.
//! - Filters are AND-of-equalities.
//! - `update` fails with [`StoreError::NotFound`] when nothing matches, while
//!   `del` reports `0`.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    AccessorConfig, CREATED_AT_COLUMN, ColumnValues, Connection, Order, PaginatedResult,
    PaginationRequest, QueryBuilder, Record, ReturnFields, Row, Schema, SqlStatement, Statement,
    StoreError, UPDATED_AT_COLUMN, now_millis,
};

/// Everything an accessor (or an extension built for it) knows about its
/// table.
#[derive(Debug, Clone)]
pub struct AccessorContext<C> {
    connection: C,
    schema: Arc<Schema>,
    return_fields: Arc<ReturnFields>,
}

impl<C: Connection> AccessorContext<C> {
    fn new(connection: C, schema: Schema, return_fields: ReturnFields) -> Result<Self, StoreError> {
        schema.validate()?;
        let return_fields = return_fields.resolve(&schema)?;
        Ok(Self {
            connection,
            schema: Arc::new(schema),
            return_fields: Arc::new(return_fields),
        })
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn return_fields(&self) -> &ReturnFields {
        &self.return_fields
    }

    /// SQL builder for this table, in the connection's dialect.
    pub fn query(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.schema, &self.return_fields, self.connection.dialect())
    }

    /// Translate a statement's keys to allowlisted columns.
    pub fn resolve(&self, statement: &Statement) -> Result<ColumnValues, StoreError> {
        ColumnValues::resolve(&self.schema, statement)
    }

    /// Run a row-returning statement and normalize the rows.
    pub async fn fetch_rows(
        &self,
        op: &'static str,
        statement: &SqlStatement,
    ) -> Result<Vec<Row>, StoreError> {
        debug!(
            table = self.schema.table(),
            op,
            sql = %statement.sql,
            params = statement.params.len(),
            "fetching rows"
        );
        let rows = self.connection.fetch_all(statement).await?;
        let dialect = self.connection.dialect();
        Ok(rows
            .into_iter()
            .map(|row| self.schema.normalize_row(row, dialect))
            .collect())
    }

    /// Run a statement and return the number of rows affected.
    pub async fn execute(
        &self,
        op: &'static str,
        statement: &SqlStatement,
    ) -> Result<u64, StoreError> {
        debug!(
            table = self.schema.table(),
            op,
            sql = %statement.sql,
            params = statement.params.len(),
            "executing"
        );
        self.connection.execute(statement).await
    }

    /// Decode a normalized row into `E`.
    pub fn decode<E: DeserializeOwned>(&self, row: Row) -> Result<E, StoreError> {
        Ok(serde_json::from_value(serde_json::Value::Object(row))?)
    }
}

/// Generic CRUD and pagination over one table.
///
/// `E` is the row type (defaults to the raw [`Row`]); `X` is whatever the
/// extension factory produced (defaults to `()`).
#[derive(Debug)]
pub struct RecordAccessor<C, E = Row, X = ()> {
    context: AccessorContext<C>,
    extension: X,
    _marker: PhantomData<fn() -> E>,
}

impl<C: Clone, E, X: Clone> Clone for RecordAccessor<C, E, X> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            extension: self.extension.clone(),
            _marker: PhantomData,
        }
    }
}

impl<C: Connection, E: DeserializeOwned> RecordAccessor<C, E> {
    /// Accessor returning every column.
    pub fn new(connection: C, schema: Schema) -> Result<Self, StoreError> {
        Self::with_return_fields(connection, schema, ReturnFields::All)
    }

    /// Accessor restricted to `return_fields`. Fails if any of them is not a
    /// column of `schema`.
    pub fn with_return_fields(
        connection: C,
        schema: Schema,
        return_fields: ReturnFields,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            context: AccessorContext::new(connection, schema, return_fields)?,
            extension: (),
            _marker: PhantomData,
        })
    }

    pub fn from_config(connection: C, config: &AccessorConfig) -> Result<Self, StoreError> {
        Self::with_return_fields(connection, config.schema(), config.return_fields())
    }

    /// Attach table-specific operations.
    ///
    /// The factory gets the same connection, schema and return fields as the
    /// accessor; its result is available through [`RecordAccessor::ext`].
    pub fn with_extension<X, F>(self, factory: F) -> RecordAccessor<C, E, X>
    where
        F: FnOnce(&AccessorContext<C>) -> X,
    {
        let extension = factory(&self.context);
        RecordAccessor {
            context: self.context,
            extension,
            _marker: PhantomData,
        }
    }
}

impl<C: Connection, E: Record> RecordAccessor<C, E> {
    /// Accessor for a `#[derive(Record)]` type, returning every column.
    pub fn for_record(connection: C) -> Result<Self, StoreError> {
        Self::new(connection, E::schema())
    }
}

impl<C: Connection, E: DeserializeOwned, X> RecordAccessor<C, E, X> {
    pub fn context(&self) -> &AccessorContext<C> {
        &self.context
    }

    pub fn schema(&self) -> &Schema {
        self.context.schema()
    }

    /// The extension built at construction.
    pub fn ext(&self) -> &X {
        &self.extension
    }

    /// Insert a row.
    ///
    /// `created_at` keeps the caller's value when given, so historical rows
    /// can be backfilled; `updated_at` is always now.
    pub async fn create(&self, statement: &Statement) -> Result<E, StoreError> {
        let values = self.stamped(statement)?;
        let sql = self.context.query().insert(&values)?;
        let row = self.first_row("create", &sql).await?;
        row.ok_or_else(|| {
            StoreError::Driver(format!("insert into {} returned no row", self.table()))
        })
    }

    /// Update every row matching `filter` and return the first one.
    ///
    /// Fails with [`StoreError::NotFound`] when no row matches.
    pub async fn update(&self, statement: &Statement, filter: &Statement) -> Result<E, StoreError> {
        let filter = self.required_filter("update", filter)?;
        let mut values = self.context.resolve(statement)?;
        values.set(self.schema(), UPDATED_AT_COLUMN, now_millis());

        let sql = self.context.query().update(&values, &filter)?;
        match self.first_row("update", &sql).await? {
            Some(row) => Ok(row),
            None => {
                debug!(table = self.table(), "update matched no rows");
                Err(StoreError::NotFound(format!(
                    "no {} row matches the update filter",
                    self.table()
                )))
            }
        }
    }

    /// Insert, or update in place the row with the same `id`.
    ///
    /// On conflict `created_at` is left untouched.
    pub async fn upsert(&self, statement: &Statement) -> Result<E, StoreError> {
        let values = self.stamped(statement)?;
        let sql = self.context.query().upsert(&values)?;
        let row = self.first_row("upsert", &sql).await?;
        row.ok_or_else(|| {
            StoreError::Driver(format!("upsert into {} returned no row", self.table()))
        })
    }

    /// First row matching `filter`, or `None`.
    pub async fn get(&self, filter: &Statement) -> Result<Option<E>, StoreError> {
        let filter = self.context.resolve(filter)?;
        let sql = self.context.query().select(&filter, None, Some(1), None);
        self.first_row("get", &sql).await
    }

    /// Every row, or every row matching `filter` when one is given.
    pub async fn list(&self, filter: Option<&Statement>) -> Result<Vec<E>, StoreError> {
        let filter = match filter {
            Some(filter) => self.context.resolve(filter)?,
            None => ColumnValues::default(),
        };
        let sql = self.context.query().select(&filter, None, None, None);
        self.rows("list", &sql).await
    }

    /// Every row matching `filter`. The filter is mandatory.
    pub async fn find(&self, filter: &Statement) -> Result<Vec<E>, StoreError> {
        let filter = self.required_filter("find", filter)?;
        let sql = self.context.query().select(&filter, None, None, None);
        self.rows("find", &sql).await
    }

    /// Delete every row matching `filter`; returns how many were removed.
    pub async fn del(&self, filter: &Statement) -> Result<u64, StoreError> {
        let filter = self.required_filter("del", filter)?;
        let sql = self.context.query().delete(&filter);
        self.context.execute("del", &sql).await
    }

    /// One page of rows plus totals.
    ///
    /// Runs a count and then a data query with the same filter; the two are
    /// not isolated from concurrent writers. Without `order_by` rows come
    /// newest first (`created_at DESC`); ties always fall back to `id`.
    pub async fn paginate(
        &self,
        request: &PaginationRequest,
    ) -> Result<PaginatedResult<E>, StoreError> {
        request.validate()?;

        let filter = match &request.filter {
            Some(filter) => self.context.resolve(filter)?,
            None => ColumnValues::default(),
        };
        let (order_column, direction) = match &request.order_by {
            Some(order_by) => (
                self.schema().resolve(&order_by.field)?.name.as_str(),
                order_by.direction,
            ),
            None => (CREATED_AT_COLUMN, Order::Desc),
        };

        let query = self.context.query();
        let count_sql = query.count(&filter);
        let total_count = self.count("paginate", &count_sql).await?;

        let data_sql = query.select(
            &filter,
            Some((order_column, direction)),
            Some(request.page_size),
            Some(request.offset()),
        );
        let data = self.rows("paginate", &data_sql).await?;

        Ok(PaginatedResult::new(data, total_count, request))
    }

    fn table(&self) -> &str {
        self.schema().table()
    }

    /// Resolve a write statement and stamp both lifecycle timestamps from a
    /// single clock reading.
    fn stamped(&self, statement: &Statement) -> Result<ColumnValues, StoreError> {
        let now = now_millis();
        let mut values = self.context.resolve(statement)?;
        values.set_if_missing(self.schema(), CREATED_AT_COLUMN, now);
        values.set(self.schema(), UPDATED_AT_COLUMN, now);
        Ok(values)
    }

    fn required_filter(
        &self,
        op: &'static str,
        filter: &Statement,
    ) -> Result<ColumnValues, StoreError> {
        let filter = self.context.resolve(filter)?;
        if filter.is_empty() {
            return Err(StoreError::EmptyFilter(op));
        }
        Ok(filter)
    }

    async fn rows(&self, op: &'static str, sql: &SqlStatement) -> Result<Vec<E>, StoreError> {
        self.context
            .fetch_rows(op, sql)
            .await?
            .into_iter()
            .map(|row| self.context.decode(row))
            .collect()
    }

    async fn first_row(
        &self,
        op: &'static str,
        sql: &SqlStatement,
    ) -> Result<Option<E>, StoreError> {
        let row = self.context.fetch_rows(op, sql).await?.into_iter().next();
        row.map(|row| self.context.decode(row)).transpose()
    }

    async fn count(&self, op: &'static str, sql: &SqlStatement) -> Result<u64, StoreError> {
        let rows = self.context.fetch_rows(op, sql).await?;
        let count = rows
            .first()
            .and_then(|row| row.get("count"))
            .and_then(count_value)
            .ok_or_else(|| {
                StoreError::Driver(format!("count over {} returned no count", self.table()))
            })?;
        Ok(count)
    }
}

/// Counts arrive as integers, or as text from drivers that return NUMERIC.
fn count_value(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
