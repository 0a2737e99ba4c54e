//! Database-agnostic SQL building.
//!
//! Statements are resolved against a [`Schema`] into [`ColumnValues`], then
//! rendered into parameterized SQL for a [`Dialect`]. Values only ever travel
//! as parameters; column names are interpolated after allowlist checks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    CREATED_AT_COLUMN, ID_COLUMN, Param, ReturnFields, Schema, Statement, StoreError, Value,
};

/// Placeholder syntax of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `$1, $2, ...`
    Postgres,
    /// `?1, ?2, ...`
    Sqlite,
}

impl Dialect {
    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite => format!("?{}", index),
        }
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Order {
    #[serde(alias = "asc")]
    Asc,
    #[default]
    #[serde(alias = "desc")]
    Desc,
}

impl Order {
    pub fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// An order-by clause. `field` uses the call-boundary naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Order,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: Order) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Order::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Order::Desc)
    }
}

/// A rendered SQL statement with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Param>,
}

/// A statement whose keys have been translated to allowlisted columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues {
    values: IndexMap<String, Param>,
}

impl ColumnValues {
    /// Translate every key of `statement` to its column.
    ///
    /// Fails on keys outside the schema, and on two keys naming the same
    /// column (e.g. `createdAt` and `created_at`).
    pub fn resolve(schema: &Schema, statement: &Statement) -> Result<Self, StoreError> {
        let mut values = IndexMap::with_capacity(statement.len());
        for (field, value) in statement.iter() {
            let column = schema.resolve(field)?;
            let param = Param::new(value.clone(), column.kind);
            if values.insert(column.name.clone(), param).is_some() {
                return Err(StoreError::InvalidStatement(format!(
                    "{} is given more than once",
                    column.name
                )));
            }
        }
        Ok(Self { values })
    }

    /// Set `column` to `value`, replacing any existing value in place.
    pub fn set(&mut self, schema: &Schema, column: &str, value: impl Into<Value>) {
        let kind = schema.kind_of(column).unwrap_or_default();
        self.values
            .insert(column.to_string(), Param::new(value.into(), kind));
    }

    /// Set `column` unless it already holds a non-null value.
    pub fn set_if_missing(&mut self, schema: &Schema, column: &str, value: impl Into<Value>) {
        let missing = self.values.get(column).is_none_or(|p| p.value.is_null());
        if missing {
            self.set(schema, column, value);
        }
    }

    pub fn get(&self, column: &str) -> Option<&Param> {
        self.values.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn params(&self) -> impl Iterator<Item = &Param> {
        self.values.values()
    }
}

/// Renders SQL for one table.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    schema: &'a Schema,
    return_fields: &'a ReturnFields,
    dialect: Dialect,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a Schema, return_fields: &'a ReturnFields, dialect: Dialect) -> Self {
        Self {
            schema,
            return_fields,
            dialect,
        }
    }

    /// `INSERT INTO t (a, b) VALUES ($1, $2) RETURNING ...`
    pub fn insert(&self, values: &ColumnValues) -> Result<SqlStatement, StoreError> {
        let (columns, placeholders) = self.insert_lists(values)?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            self.schema.table(),
            columns,
            placeholders,
            self.return_fields.to_sql()
        );

        Ok(SqlStatement {
            sql,
            params: values.params().cloned().collect(),
        })
    }

    /// Insert, or update the row whose `id` conflicts.
    ///
    /// Every column except `id` and `created_at` is taken from the proposed
    /// row on conflict. Without an `id` the store assigns one and the row is
    /// always inserted.
    pub fn upsert(&self, values: &ColumnValues) -> Result<SqlStatement, StoreError> {
        let (columns, placeholders) = self.insert_lists(values)?;
        let updates: Vec<String> = values
            .columns()
            .filter(|c| *c != ID_COLUMN && *c != CREATED_AT_COLUMN)
            .map(|c| format!("{} = EXCLUDED.{}", c, c))
            .collect();

        if updates.is_empty() {
            return Err(StoreError::InvalidStatement(
                "upsert has no columns to update on conflict".to_string(),
            ));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) DO UPDATE SET {} RETURNING {}",
            self.schema.table(),
            columns,
            placeholders,
            ID_COLUMN,
            updates.join(", "),
            self.return_fields.to_sql()
        );

        Ok(SqlStatement {
            sql,
            params: values.params().cloned().collect(),
        })
    }

    /// `UPDATE t SET a = $1 WHERE b = $2 RETURNING ...`, params `[set.., where..]`.
    pub fn update(
        &self,
        values: &ColumnValues,
        filter: &ColumnValues,
    ) -> Result<SqlStatement, StoreError> {
        if values.is_empty() {
            return Err(StoreError::InvalidStatement(
                "update has no fields to set".to_string(),
            ));
        }

        let assignments: Vec<String> = values
            .columns()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", c, self.dialect.placeholder(i + 1)))
            .collect();
        let where_clause = self.where_clause(filter, values.len() + 1);

        let sql = format!(
            "UPDATE {} SET {}{} RETURNING {}",
            self.schema.table(),
            assignments.join(", "),
            where_clause,
            self.return_fields.to_sql()
        );

        Ok(SqlStatement {
            sql,
            params: values.params().chain(filter.params()).cloned().collect(),
        })
    }

    /// `SELECT <return fields> FROM t [WHERE ..] [ORDER BY ..] [LIMIT n] [OFFSET n]`
    ///
    /// `order_by` must already be resolved to a column. Ties are broken on
    /// `id` in the same direction so LIMIT/OFFSET slices are stable.
    pub fn select(
        &self,
        filter: &ColumnValues,
        order_by: Option<(&str, Order)>,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> SqlStatement {
        let mut sql = format!(
            "SELECT {} FROM {}{}",
            self.return_fields.to_sql(),
            self.schema.table(),
            self.where_clause(filter, 1)
        );

        if let Some((column, order)) = order_by {
            sql.push_str(&format!(" ORDER BY {} {}", column, order.as_sql()));
            if column != ID_COLUMN {
                sql.push_str(&format!(", {} {}", ID_COLUMN, order.as_sql()));
            }
        }
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        SqlStatement {
            sql,
            params: filter.params().cloned().collect(),
        }
    }

    /// `SELECT COUNT(*) AS count FROM t [WHERE ..]`
    pub fn count(&self, filter: &ColumnValues) -> SqlStatement {
        SqlStatement {
            sql: format!(
                "SELECT COUNT(*) AS count FROM {}{}",
                self.schema.table(),
                self.where_clause(filter, 1)
            ),
            params: filter.params().cloned().collect(),
        }
    }

    /// `DELETE FROM t [WHERE ..]`
    pub fn delete(&self, filter: &ColumnValues) -> SqlStatement {
        SqlStatement {
            sql: format!(
                "DELETE FROM {}{}",
                self.schema.table(),
                self.where_clause(filter, 1)
            ),
            params: filter.params().cloned().collect(),
        }
    }

    fn insert_lists(&self, values: &ColumnValues) -> Result<(String, String), StoreError> {
        if values.is_empty() {
            return Err(StoreError::InvalidStatement(
                "insert has no fields".to_string(),
            ));
        }

        let columns: Vec<&str> = values.columns().collect();
        let placeholders: Vec<String> = (1..=values.len())
            .map(|i| self.dialect.placeholder(i))
            .collect();
        Ok((columns.join(", "), placeholders.join(", ")))
    }

    /// Build an AND-of-equalities WHERE clause, numbering from `start_param`.
    fn where_clause(&self, filter: &ColumnValues, start_param: usize) -> String {
        if filter.is_empty() {
            return String::new();
        }

        let clauses: Vec<String> = filter
            .columns()
            .enumerate()
            .map(|(i, c)| format!("{} = {}", c, self.dialect.placeholder(start_param + i)))
            .collect();

        format!(" WHERE {}", clauses.join(" AND "))
    }
}
