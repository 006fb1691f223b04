//! Database value enumeration for type-safe column values
//!
//! A small closed set of scalar types covering everything the paranoid
//! column and association keys can hold. The same representation is used
//! for query parameters, row contents, and in-memory deletion checks.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A single column value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl DatabaseValue {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Get the timestamp if this value holds one
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            DatabaseValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Get the text contents if this value holds a string
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DatabaseValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Compare two values of the same variant; `None` for NULLs and
    /// mismatched variants, mirroring SQL comparison semantics.
    pub fn compare(&self, other: &DatabaseValue) -> Option<Ordering> {
        match (self, other) {
            (DatabaseValue::Int(a), DatabaseValue::Int(b)) => Some(a.cmp(b)),
            (DatabaseValue::Float(a), DatabaseValue::Float(b)) => a.partial_cmp(b),
            (DatabaseValue::Text(a), DatabaseValue::Text(b)) => Some(a.cmp(b)),
            (DatabaseValue::Timestamp(a), DatabaseValue::Timestamp(b)) => Some(a.cmp(b)),
            (DatabaseValue::Bool(a), DatabaseValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Int(i) => JsonValue::from(*i),
            DatabaseValue::Float(f) => {
                JsonValue::from(serde_json::Number::from_f64(*f).unwrap_or_else(|| 0.into()))
            }
            DatabaseValue::Text(s) => JsonValue::String(s.clone()),
            DatabaseValue::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Int(value)
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::Text(value.to_string())
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::Text(value)
    }
}

impl From<DateTime<Utc>> for DatabaseValue {
    fn from(value: DateTime<Utc>) -> Self {
        DatabaseValue::Timestamp(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_detection() {
        assert!(DatabaseValue::Null.is_null());
        assert!(!DatabaseValue::Bool(false).is_null());
        assert!(DatabaseValue::from(None::<i64>).is_null());
    }

    #[test]
    fn test_compare_same_variant() {
        let a = DatabaseValue::Int(1);
        let b = DatabaseValue::Int(2);
        assert_eq!(a.compare(&b), Some(Ordering::Less));

        let t0 = Utc::now();
        let later = t0 + chrono::Duration::minutes(5);
        assert_eq!(
            DatabaseValue::Timestamp(later).compare(&DatabaseValue::Timestamp(t0)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_null_is_incomparable() {
        assert_eq!(DatabaseValue::Null.compare(&DatabaseValue::Int(1)), None);
        assert_eq!(DatabaseValue::Int(1).compare(&DatabaseValue::Text("1".into())), None);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(DatabaseValue::Null.to_json(), JsonValue::Null);
        assert_eq!(DatabaseValue::Int(7).to_json(), JsonValue::from(7));
        assert_eq!(
            DatabaseValue::Text("deleted".into()).to_json(),
            JsonValue::String("deleted".into())
        );
    }
}
