//! Dynamic record representation
//!
//! A record is a field map plus persistence flags. Deletion state is never
//! stored separately; it is derived from the paranoid column value by the
//! column policy. After a permanent destroy a record is frozen and refuses
//! further field mutation.

use std::collections::HashMap;

use crate::error::{ParanoidError, ParanoidResult};
use crate::predicate::Row;
use crate::value::DatabaseValue;

/// An entity with a unique identifier, a field map, and persistence flags
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: Row,
    persisted: bool,
    destroyed: bool,
    frozen: bool,
}

impl Record {
    /// Create an unpersisted record of the given registered type
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: HashMap::new(),
            persisted: false,
            destroyed: false,
            frozen: false,
        }
    }

    /// Build a persisted record from a row fetched through the backend
    pub fn from_row(type_name: &str, fields: Row) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields,
            persisted: true,
            destroyed: false,
            frozen: false,
        }
    }

    /// The registered type name of this record
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the record's field map
    pub fn fields(&self) -> &Row {
        &self.fields
    }

    /// Get a field value; absent fields read as NULL
    pub fn get(&self, field: &str) -> &DatabaseValue {
        self.fields.get(field).unwrap_or(&DatabaseValue::Null)
    }

    /// Get an owned copy of a field value
    pub fn value_of(&self, field: &str) -> DatabaseValue {
        self.get(field).clone()
    }

    /// Set a field value; fails on a frozen record
    pub fn set<V: Into<DatabaseValue>>(&mut self, field: &str, value: V) -> ParanoidResult<()> {
        if self.frozen {
            return Err(ParanoidError::RecordFrozen(self.type_name.clone()));
        }
        self.fields.insert(field.to_string(), value.into());
        Ok(())
    }

    /// Whether this record exists in storage and has not been permanently
    /// destroyed
    pub fn is_persisted(&self) -> bool {
        self.persisted && !self.destroyed
    }

    /// Mark the record as persisted (after a successful save)
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Mark the record as permanently destroyed
    pub fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Freeze the record; all subsequent field mutation fails
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether the record has been frozen by a permanent destroy
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// The record's fields as a JSON object, for serialization and
    /// diagnostics
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(field, value)| (field.clone(), value.to_json()))
                .collect(),
        )
    }
}
