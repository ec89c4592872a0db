//! Record values
//!
//! Host records are heterogeneous key/value maps. Each value is classified
//! into a [`Value`] variant, and every variant has exactly one bind rule
//! ([`Value::binding`]) describing how it travels to the warehouse.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ConnectorError;

/// Warehouse bind types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindType {
    Text,
    Fixed,
    Real,
    Boolean,
    TimestampLtz,
}

impl BindType {
    /// Type name as the query endpoint expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Fixed => "FIXED",
            Self::Real => "REAL",
            Self::Boolean => "BOOLEAN",
            Self::TimestampLtz => "TIMESTAMP_LTZ",
        }
    }
}

/// A classified value ready to bind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub bind_type: BindType,
    /// Textual value; `None` binds SQL NULL
    pub value: Option<String>,
}

/// A single column value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    /// Nested structure (list or object) with no native column type
    Document(serde_json::Value),
}

impl Value {
    /// Classify a JSON value.
    ///
    /// Scalars map to their native variants; arrays and objects become
    /// [`Value::Document`]. Integers outside the `i64` range fall back to
    /// [`Value::Float`].
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            doc @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Document(doc)
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Bind rule for this value
    pub fn binding(&self) -> Binding {
        let (bind_type, value) = match self {
            Self::Null => (BindType::Text, None),
            Self::Boolean(b) => (BindType::Boolean, Some(b.to_string())),
            Self::Integer(i) => (BindType::Fixed, Some(i.to_string())),
            Self::Float(f) => (BindType::Real, Some(f.to_string())),
            Self::String(s) => (BindType::Text, Some(s.clone())),
            Self::Timestamp(ts) => match ts.timestamp_nanos_opt() {
                Some(nanos) => (BindType::TimestampLtz, Some(nanos.to_string())),
                // Outside the nanosecond range (years before 1677 or after 2262)
                None => (
                    BindType::Text,
                    Some(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                ),
            },
            Self::Document(doc) => (BindType::Text, Some(doc.to_string())),
        };
        Binding { bind_type, value }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One row: column name -> value, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing any existing value in place.
    ///
    /// Returns the previous value if the column was already present.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.fields.push((column, value));
                None
            }
        }
    }

    /// Builder-style insert
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column names in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a JSON object into a record, keeping key order
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidRecord`] if `value` is not an object.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ConnectorError> {
        match value {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(ConnectorError::InvalidRecord(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(json!(null)), Value::Null);
        assert_eq!(Value::from_json(json!(true)), Value::Boolean(true));
        assert_eq!(Value::from_json(json!(42)), Value::Integer(42));
        assert_eq!(Value::from_json(json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from_json(json!("a")), Value::String("a".into()));
    }

    #[test]
    fn test_from_json_nested_becomes_document() {
        assert_eq!(
            Value::from_json(json!([1, 2])),
            Value::Document(json!([1, 2]))
        );
        assert_eq!(
            Value::from_json(json!({"a": 1})),
            Value::Document(json!({"a": 1}))
        );
    }

    #[test]
    fn test_from_json_u64_overflow_is_float() {
        let v = Value::from_json(json!(u64::MAX));
        assert!(matches!(v, Value::Float(_)));
    }

    #[test]
    fn test_binding_per_variant() {
        let cases = [
            (Value::Null, BindType::Text, None),
            (Value::Boolean(false), BindType::Boolean, Some("false")),
            (Value::Integer(-7), BindType::Fixed, Some("-7")),
            (Value::Float(2.5), BindType::Real, Some("2.5")),
            (Value::String("x".into()), BindType::Text, Some("x")),
        ];
        for (value, bind_type, text) in cases {
            let binding = value.binding();
            assert_eq!(binding.bind_type, bind_type, "{:?}", value);
            assert_eq!(binding.value.as_deref(), text, "{:?}", value);
        }
    }

    #[test]
    fn test_binding_timestamp_is_epoch_nanos() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let binding = Value::Timestamp(ts).binding();
        assert_eq!(binding.bind_type, BindType::TimestampLtz);
        assert_eq!(binding.value, Some("1704164645000000000".to_string()));
    }

    #[test]
    fn test_binding_document_serializes_json() {
        let binding = Value::Document(json!({"tags": ["a", "b"]})).binding();
        assert_eq!(binding.bind_type, BindType::Text);
        assert_eq!(binding.value.as_deref(), Some(r#"{"tags":["a","b"]}"#));
    }

    #[test]
    fn test_record_insert_replaces_in_place() {
        let mut record = Record::new().with("Id", 1).with("Name", "a");
        let previous = record.insert("Id", 2);
        assert_eq!(previous, Some(Value::Integer(1)));
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["Id", "Name"]);
        assert_eq!(record.get("Id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_record_from_json_keeps_order() {
        let record = Record::from_json(json!({"Zeta": 1, "Alpha": "x", "Mid": null})).unwrap();
        assert_eq!(
            record.columns().collect::<Vec<_>>(),
            vec!["Zeta", "Alpha", "Mid"]
        );
        assert_eq!(record.get("Mid"), Some(&Value::Null));
    }

    #[test]
    fn test_record_from_json_rejects_non_object() {
        let result = Record::from_json(json!([1, 2, 3]));
        assert!(matches!(result, Err(ConnectorError::InvalidRecord(_))));
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<i64> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
    }
}
