//! Table schemas and the column allowlist.
//!
//! A [`Schema`] names a table and the columns an accessor may touch. Every
//! field name that reaches generated SQL (statement keys, order-by fields,
//! return fields) is translated to snake_case and checked against it first.

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use crate::{Dialect, Row, StoreError};

pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Storage type of a column, database-agnostic.
///
/// Used by backends to bind nulls with the right type and by
/// [`Schema::normalize_row`] to undo storage encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    Any,
    Text,
    #[serde(alias = "bigint")]
    Integer,
    Float,
    Boolean,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Table name plus the allowlisted columns.
///
/// Always carries the lifecycle columns `id`, `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    table: String,
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec![
                Column {
                    name: ID_COLUMN.to_string(),
                    kind: ColumnKind::Any,
                },
                Column {
                    name: CREATED_AT_COLUMN.to_string(),
                    kind: ColumnKind::Integer,
                },
                Column {
                    name: UPDATED_AT_COLUMN.to_string(),
                    kind: ColumnKind::Integer,
                },
            ],
        }
    }

    /// Add a column, or change the kind of an existing one.
    pub fn column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        let name = name.into().to_snake_case();
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.kind = kind,
            None => self.columns.push(Column { name, kind }),
        }
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.kind)
    }

    /// Translate a call-boundary field name to its column, rejecting names
    /// outside the allowlist.
    pub fn resolve(&self, field: &str) -> Result<&Column, StoreError> {
        let name = field.to_snake_case();
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| {
                StoreError::InvalidField(format!(
                    "{} is not a column of {}",
                    field, self.table
                ))
            })
    }

    /// Check that the table and every column are plain SQL identifiers.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_identifier(&self.table, true)?;
        for column in &self.columns {
            validate_identifier(&column.name, false)?;
        }
        Ok(())
    }

    /// Undo storage encodings so rows look the same on every backend.
    ///
    /// Integer booleans become booleans. On SQLite, JSON columns hold the
    /// document's text encoding and are parsed back; PostgreSQL returns
    /// JSONB already decoded, so its strings are left alone.
    pub fn normalize_row(&self, mut row: Row, dialect: Dialect) -> Row {
        let json_as_text = dialect == Dialect::Sqlite;
        for (name, value) in row.iter_mut() {
            let Some(kind) = self.kind_of(name) else {
                continue;
            };
            let decoded = match (kind, &*value) {
                (ColumnKind::Json, serde_json::Value::String(s)) if json_as_text => {
                    serde_json::from_str::<serde_json::Value>(s).ok()
                }
                (ColumnKind::Boolean, serde_json::Value::Number(n)) => {
                    n.as_i64().map(|i| serde_json::Value::Bool(i != 0))
                }
                _ => None,
            };
            if let Some(decoded) = decoded {
                *value = decoded;
            }
        }
        row
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*`, plus `.` for schema-qualified tables.
fn validate_identifier(name: &str, allow_dot: bool) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest =
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || (allow_dot && c == '.'));

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(StoreError::InvalidField(format!(
            "{:?} is not a valid identifier",
            name
        )))
    }
}

/// The columns every generated `SELECT`/`RETURNING` clause returns.
///
/// Fixed when an accessor is built; never taken from per-call input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReturnFields {
    #[default]
    All,
    Columns(Vec<String>),
}

impl ReturnFields {
    /// Build from a field list; `*` anywhere selects every column.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() || fields.iter().any(|f| f == "*") {
            ReturnFields::All
        } else {
            ReturnFields::Columns(fields)
        }
    }

    /// Resolve every field against the schema.
    pub fn resolve(self, schema: &Schema) -> Result<Self, StoreError> {
        match self {
            ReturnFields::All => Ok(ReturnFields::All),
            ReturnFields::Columns(fields) => fields
                .iter()
                .map(|f| schema.resolve(f).map(|c| c.name.clone()))
                .collect::<Result<Vec<_>, _>>()
                .map(ReturnFields::Columns),
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            ReturnFields::All => "*".to_string(),
            ReturnFields::Columns(columns) => columns.join(", "),
        }
    }
}

/// Types that map to a table row.
///
/// Generated by `#[derive(Record)]` with `#[record(table = "...")]`.
///
/// # Example
///
/// ```text
/// #[derive(Record, Deserialize)]
/// #[record(table = "users")]
/// pub struct User {
///     pub id: i64,
///     pub email: String,
///     pub settings: serde_json::Value,
///     pub created_at: i64,
///     pub updated_at: i64,
/// }
/// ```
pub trait Record: serde::de::DeserializeOwned + Send + Sync {
    /// The database table name for this type.
    fn table_name() -> &'static str;

    /// Table plus every non-skipped field as a column.
    fn schema() -> Schema;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> Schema {
        Schema::new("users")
            .column("email", ColumnKind::Text)
            .column("isAdmin", ColumnKind::Boolean)
            .column("settings", ColumnKind::Json)
    }

    #[test]
    fn lifecycle_columns_are_always_present() {
        let schema = Schema::new("users");
        let names: Vec<_> = schema.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "created_at", "updated_at"]);
    }

    #[test]
    fn resolve_translates_camel_case() {
        let schema = users();
        assert_eq!(schema.resolve("isAdmin").unwrap().name, "is_admin");
        assert_eq!(schema.resolve("createdAt").unwrap().name, "created_at");
        assert_eq!(schema.resolve("is_admin").unwrap().name, "is_admin");
    }

    #[test]
    fn resolve_rejects_unknown_fields() {
        let err = users().resolve("password; DROP TABLE users").unwrap_err();
        assert!(matches!(err, StoreError::InvalidField(_)));
    }

    #[test]
    fn validate_rejects_bad_identifiers() {
        assert!(users().validate().is_ok());
        assert!(Schema::new("public.users").validate().is_ok());
        assert!(Schema::new("users;--").validate().is_err());
        assert!(Schema::new("users").column("1st", ColumnKind::Text).validate().is_err());
    }

    #[test]
    fn return_fields_star_means_all() {
        assert_eq!(ReturnFields::from_fields(["*"]), ReturnFields::All);
        assert_eq!(ReturnFields::from_fields(Vec::<String>::new()), ReturnFields::All);

        let fields = ReturnFields::from_fields(["id", "email"]).resolve(&users()).unwrap();
        assert_eq!(fields.to_sql(), "id, email");

        let err = ReturnFields::from_fields(["id", "password"]).resolve(&users());
        assert!(err.is_err());
    }

    fn row(value: serde_json::Value) -> Row {
        let serde_json::Value::Object(row) = value else {
            unreachable!()
        };
        row
    }

    #[test]
    fn normalize_row_decodes_json_text_and_integer_booleans() {
        let stored = row(json!({
            "id": 1,
            "is_admin": 1,
            "settings": "{\"theme\":\"dark\"}",
            "email": "{\"not\":\"json column\"}"
        }));

        let decoded = users().normalize_row(stored, Dialect::Sqlite);
        assert_eq!(decoded["is_admin"], json!(true));
        assert_eq!(decoded["settings"], json!({"theme": "dark"}));
        assert_eq!(decoded["email"], json!("{\"not\":\"json column\"}"));
    }

    #[test]
    fn normalize_row_leaves_postgres_json_strings_alone() {
        let stored = row(json!({
            "settings": "{\"theme\":\"dark\"}",
            "is_admin": true
        }));

        let decoded = users().normalize_row(stored, Dialect::Postgres);
        assert_eq!(decoded["settings"], json!("{\"theme\":\"dark\"}"));
        assert_eq!(decoded["is_admin"], json!(true));
    }
}
