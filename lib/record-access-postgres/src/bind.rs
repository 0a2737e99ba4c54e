//! Parameter binding and row decoding for PostgreSQL.

use record_access::{ColumnKind, Param, Row, StoreError, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, Column, Row as _, TypeInfo};

fn arg_error(e: sqlx::error::BoxDynError) -> StoreError {
    StoreError::Driver(e.to_string())
}

/// Bind statement parameters in order.
///
/// Nulls are typed from the column kind; anything bound against a JSON
/// column is sent as JSONB.
pub fn bind_params(params: &[Param]) -> Result<PgArguments, StoreError> {
    let mut args = PgArguments::default();
    for param in params {
        bind_param(&mut args, param)?;
    }
    Ok(args)
}

fn bind_param(args: &mut PgArguments, param: &Param) -> Result<(), StoreError> {
    match (&param.value, param.kind) {
        (Value::Null, kind) => match kind {
            ColumnKind::Integer => args.add(None::<i64>),
            ColumnKind::Float => args.add(None::<f64>),
            ColumnKind::Boolean => args.add(None::<bool>),
            ColumnKind::Json => args.add(None::<serde_json::Value>),
            ColumnKind::Text | ColumnKind::Any => args.add(None::<String>),
        }
        .map_err(arg_error)?,
        (Value::Json(v), _) => args.add(v.clone()).map_err(arg_error)?,
        (scalar, ColumnKind::Json) => args.add(scalar.to_json()).map_err(arg_error)?,
        (Value::Int(n), ColumnKind::Float) => args.add(*n as f64).map_err(arg_error)?,
        (Value::Bool(b), _) => args.add(*b).map_err(arg_error)?,
        (Value::Int(n), _) => args.add(*n).map_err(arg_error)?,
        (Value::Float(n), _) => args.add(*n).map_err(arg_error)?,
        (Value::String(s), _) => args.add(s.as_str()).map_err(arg_error)?,
    }
    Ok(())
}

/// Decode a PostgreSQL row into a JSON map keyed by column name.
///
/// Null columns are kept as JSON null.
pub fn row_to_json(row: &PgRow) -> Result<Row, StoreError> {
    let mut obj = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = extract_column_value(row, idx)?;
        obj.insert(column.name().to_string(), value);
    }
    Ok(obj)
}

/// Extract a column value from a row as JSON
fn extract_column_value(row: &PgRow, idx: usize) -> Result<serde_json::Value, StoreError> {
    use serde_json::Value as Json;

    let type_name = row.columns()[idx].type_info().name().to_string();
    let get_error = |e: sqlx::Error| StoreError::Driver(e.to_string());

    // Handle based on PostgreSQL type
    let value = match type_name.as_str() {
        "BOOL" => {
            let v: Option<bool> = row.try_get(idx).map_err(get_error)?;
            v.map(Json::Bool).unwrap_or(Json::Null)
        }
        "INT2" => {
            let v: Option<i16> = row.try_get(idx).map_err(get_error)?;
            v.map(|n| Json::Number(n.into())).unwrap_or(Json::Null)
        }
        "INT4" => {
            let v: Option<i32> = row.try_get(idx).map_err(get_error)?;
            v.map(|n| Json::Number(n.into())).unwrap_or(Json::Null)
        }
        "INT8" => {
            let v: Option<i64> = row.try_get(idx).map_err(get_error)?;
            v.map(|n| Json::Number(n.into())).unwrap_or(Json::Null)
        }
        "FLOAT4" => {
            let v: Option<f32> = row.try_get(idx).map_err(get_error)?;
            v.and_then(|n| serde_json::Number::from_f64(n.into()).map(Json::Number))
                .unwrap_or(Json::Null)
        }
        "FLOAT8" => {
            let v: Option<f64> = row.try_get(idx).map_err(get_error)?;
            v.and_then(|n| serde_json::Number::from_f64(n).map(Json::Number))
                .unwrap_or(Json::Null)
        }
        "TIMESTAMPTZ" => {
            let v: Option<chrono::DateTime<chrono::Utc>> = row.try_get(idx).map_err(get_error)?;
            v.map(|dt| Json::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)))
                .unwrap_or(Json::Null)
        }
        "TIMESTAMP" => {
            let v: Option<chrono::NaiveDateTime> = row.try_get(idx).map_err(get_error)?;
            v.map(|dt| Json::String(dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()))
                .unwrap_or(Json::Null)
        }
        "JSONB" | "JSON" => {
            let v: Option<Json> = row.try_get(idx).map_err(get_error)?;
            v.unwrap_or(Json::Null)
        }
        _ => {
            // Default: treat as string (VARCHAR, TEXT, CHAR, etc.)
            let v: Option<String> = row.try_get(idx).map_err(|e| {
                StoreError::Driver(format!("unsupported column type {}: {}", type_name, e))
            })?;
            v.map(Json::String).unwrap_or(Json::Null)
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn binds_every_param() {
        let params = vec![
            Param::new(Value::from("a"), ColumnKind::Text),
            Param::new(Value::Int(1), ColumnKind::Integer),
            Param::new(Value::Null, ColumnKind::Json),
            Param::new(Value::Json(json!({"k": [1, 2]})), ColumnKind::Json),
            Param::new(Value::Bool(true), ColumnKind::Json),
        ];
        let args = bind_params(&params).unwrap();
        assert_eq!(args.len(), params.len());
    }
}
