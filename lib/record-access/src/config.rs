//! Configuration for connections and accessors.

use serde::Deserialize;

use crate::{ColumnKind, ReturnFields, Schema};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

/// Connection configuration for database backends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionConfig {
    /// Connect using a database URL string.
    Url(String),
}

impl From<&str> for ConnectionConfig {
    fn from(url: &str) -> Self {
        ConnectionConfig::Url(url.to_string())
    }
}

impl From<String> for ConnectionConfig {
    fn from(url: String) -> Self {
        ConnectionConfig::Url(url)
    }
}

impl From<&String> for ConnectionConfig {
    fn from(url: &String) -> Self {
        ConnectionConfig::Url(url.clone())
    }
}

/// Pool sizing handed to the backend driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default)]
    pub kind: ColumnKind,
}

/// Declarative accessor definition, e.g. from a config file:
///
/// ```text
/// {
///   "table": "users",
///   "columns": [{ "name": "email", "kind": "text" }, { "name": "settings", "kind": "json" }],
///   "return_fields": ["id", "email"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessorConfig {
    pub table: String,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    #[serde(default = "default_return_fields")]
    pub return_fields: Vec<String>,
}

fn default_return_fields() -> Vec<String> {
    vec!["*".to_string()]
}

impl AccessorConfig {
    pub fn schema(&self) -> Schema {
        self.columns
            .iter()
            .fold(Schema::new(&self.table), |schema, column| {
                schema.column(&column.name, column.kind)
            })
    }

    pub fn return_fields(&self) -> ReturnFields {
        ReturnFields::from_fields(self.return_fields.iter().cloned())
    }
}
