//! Parameter binding and row decoding for SQLite.

use record_access::{ColumnKind, Param, Row, StoreError, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Column, Row as _, TypeInfo, ValueRef};

fn arg_error(e: sqlx::error::BoxDynError) -> StoreError {
    StoreError::Driver(e.to_string())
}

/// Bind statement parameters in order.
///
/// SQLite is dynamically typed, so nulls need no type. Anything bound
/// against a JSON column is stored as its JSON text, so strings keep their
/// quotes and booleans stay `true`/`false` when read back.
pub fn bind_params<'q>(params: &[Param]) -> Result<SqliteArguments<'q>, StoreError> {
    let mut args = SqliteArguments::default();
    for param in params {
        let added = match (&param.value, param.kind) {
            (Value::Null, _) => args.add(None::<String>),
            (value, ColumnKind::Json) => args.add(value.to_json().to_string()),
            (value, _) => bind_scalar(&mut args, value),
        };
        added.map_err(arg_error)?;
    }
    Ok(args)
}

fn bind_scalar(
    args: &mut SqliteArguments<'_>,
    value: &Value,
) -> Result<(), sqlx::error::BoxDynError> {
    match value {
        Value::Null => args.add(None::<String>),
        Value::Bool(b) => args.add(*b),
        Value::Int(n) => args.add(*n),
        Value::Float(n) => args.add(*n),
        Value::String(s) => args.add(s.clone()),
        Value::Json(v) => args.add(v.to_string()),
    }
}

/// Decode a SQLite row into a JSON map keyed by column name.
///
/// Values are decoded by their runtime storage class.
pub fn row_to_json(row: &SqliteRow) -> Result<Row, StoreError> {
    let mut obj = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = extract_column_value(row, idx)?;
        obj.insert(column.name().to_string(), value);
    }
    Ok(obj)
}

fn extract_column_value(row: &SqliteRow, idx: usize) -> Result<serde_json::Value, StoreError> {
    use serde_json::Value as Json;

    let get_error = |e: sqlx::Error| StoreError::Driver(e.to_string());

    let raw = row.try_get_raw(idx).map_err(get_error)?;
    if raw.is_null() {
        return Ok(Json::Null);
    }
    let storage_class = raw.type_info().name().to_string();

    let value = match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => {
            let v: i64 = row.try_get(idx).map_err(get_error)?;
            Json::Number(v.into())
        }
        "REAL" | "NUMERIC" => {
            let v: f64 = row.try_get(idx).map_err(get_error)?;
            serde_json::Number::from_f64(v)
                .map(Json::Number)
                .unwrap_or(Json::Null)
        }
        "BLOB" => {
            let v: Vec<u8> = row.try_get(idx).map_err(get_error)?;
            Json::Array(v.into_iter().map(|b| Json::Number(b.into())).collect())
        }
        _ => {
            let v: String = row.try_get(idx).map_err(get_error)?;
            Json::String(v)
        }
    };

    Ok(value)
}
