//! Statements: field name to value maps used as write payloads and as
//! equality filters.

use indexmap::IndexMap;

use crate::{StoreError, Value};

/// An ordered mapping of field name to value.
///
/// Keys are given in the call-boundary convention (camelCase) and translated
/// to column names when SQL is built. Insertion order is kept and determines
/// positional parameter order; re-setting a field replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    fields: IndexMap<String, Value>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a statement from a JSON object, keeping key order.
    pub fn from_json(value: serde_json::Value) -> Result<Self, StoreError> {
        match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(StoreError::InvalidStatement(format!(
                "expected a JSON object, got {}",
                other
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Statement {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut statement = Statement::new();
        for (k, v) in iter {
            statement.insert(k, v);
        }
        statement
    }
}

impl IntoIterator for Statement {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl TryFrom<serde_json::Value> for Statement {
    type Error = StoreError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        Statement::from_json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_insertion_order_and_replaces_in_place() {
        let s = Statement::new()
            .set("name", "a")
            .set("email", "a@x.io")
            .set("name", "b");

        let keys: Vec<_> = s.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "email"]);
        assert_eq!(s.get("name"), Some(&Value::from("b")));
    }

    #[test]
    fn from_json_requires_an_object() {
        let s = Statement::from_json(json!({"b": 1, "a": {"x": true}})).unwrap();
        let keys: Vec<_> = s.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(s.get("a"), Some(&Value::Json(json!({"x": true}))));

        let err = Statement::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, StoreError::InvalidStatement(_)));
    }
}
