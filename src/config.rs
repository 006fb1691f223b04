//! Paranoid column configuration and policy
//!
//! One immutable configuration per record type decides how "deleted" is
//! encoded: a nullable timestamp, a boolean flag, or a string column with a
//! sentinel value. The policy functions derived from it (default scope
//! predicate, deleted-now value, in-memory deletion check) are pure and
//! shared by the scope and lifecycle engines.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParanoidError, ParanoidResult};
use crate::predicate::Predicate;
use crate::value::DatabaseValue;

/// Column types that can encode deletion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Nullable timestamp: NULL = live, deletion time = deleted
    Timestamp,
    /// Boolean flag: false = live, true = deleted
    Boolean,
    /// String column with a configured sentinel value marking deletion
    Text,
}

/// Per-record-type paranoid column configuration, immutable after
/// registration
#[derive(Debug, Clone, PartialEq)]
pub struct ParanoidConfig {
    column: String,
    column_type: ColumnType,
    deleted_value: Option<String>,
    allow_nulls: bool,
    recover_dependent_associations: bool,
    dependent_recovery_window: Option<Duration>,
    dependent_destroy_paranoid_only: bool,
}

impl Default for ParanoidConfig {
    fn default() -> Self {
        Self {
            column: "deleted_at".to_string(),
            column_type: ColumnType::Timestamp,
            deleted_value: None,
            allow_nulls: true,
            recover_dependent_associations: true,
            dependent_recovery_window: Some(Duration::minutes(2)),
            dependent_destroy_paranoid_only: true,
        }
    }
}

impl ParanoidConfig {
    /// Create a configuration with the default timestamp column
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the paranoid column name
    pub fn with_column(mut self, column: &str) -> Self {
        self.column = column.to_string();
        self
    }

    /// Set the column type
    pub fn with_column_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    /// Set the sentinel marking deletion (Text columns only)
    pub fn with_deleted_value(mut self, deleted_value: &str) -> Self {
        self.deleted_value = Some(deleted_value.to_string());
        self
    }

    /// Set whether the column is nullable (affects Boolean semantics)
    pub fn with_allow_nulls(mut self, allow_nulls: bool) -> Self {
        self.allow_nulls = allow_nulls;
        self
    }

    /// Set whether `recover` cascades to dependents by default
    pub fn with_recover_dependent_associations(mut self, recover: bool) -> Self {
        self.recover_dependent_associations = recover;
        self
    }

    /// Set the default recovery window for cascading recovery;
    /// `None` means unbounded
    pub fn with_dependent_recovery_window(mut self, window: Option<Duration>) -> Self {
        self.dependent_recovery_window = window;
        self
    }

    /// Set whether soft destroy runs the paranoid-only cascade branch
    pub fn with_dependent_destroy_paranoid_only(mut self, paranoid_only: bool) -> Self {
        self.dependent_destroy_paranoid_only = paranoid_only;
        self
    }

    /// Validate the configuration; called at type registration so that a
    /// bad setup fails before any record operation is possible
    pub fn validate(&self) -> ParanoidResult<()> {
        if self.column.is_empty() {
            return Err(ParanoidError::Configuration(
                "paranoid column name must not be empty".to_string(),
            ));
        }

        match self.column_type {
            ColumnType::Text => {
                if self.deleted_value.is_none() {
                    return Err(ParanoidError::Configuration(format!(
                        "Text paranoid column '{}' requires a deleted_value sentinel",
                        self.column
                    )));
                }
            }
            ColumnType::Timestamp | ColumnType::Boolean => {
                if self.deleted_value.is_some() {
                    return Err(ParanoidError::Configuration(format!(
                        "deleted_value is only valid for Text columns, column '{}' is {:?}",
                        self.column, self.column_type
                    )));
                }
            }
        }

        Ok(())
    }

    /// The paranoid column name
    pub fn column(&self) -> &str {
        &self.column
    }

    /// The paranoid column type
    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Whether `recover` cascades by default
    pub fn recover_dependent_associations(&self) -> bool {
        self.recover_dependent_associations
    }

    /// Default window for cascading recovery
    pub fn dependent_recovery_window(&self) -> Option<Duration> {
        self.dependent_recovery_window
    }

    /// Whether soft destroy uses the paranoid-only cascade branch
    pub fn dependent_destroy_paranoid_only(&self) -> bool {
        self.dependent_destroy_paranoid_only
    }

    /// Text column with a configured sentinel
    pub fn text_with_sentinel(&self) -> bool {
        self.column_type == ColumnType::Text && self.deleted_value.is_some()
    }

    /// Non-nullable boolean column
    pub fn boolean_not_nullable(&self) -> bool {
        self.column_type == ColumnType::Boolean && !self.allow_nulls
    }

    /// The default-scope predicate selecting rows that are NOT deleted
    pub fn retained_predicate(&self) -> Predicate {
        if self.text_with_sentinel() {
            let sentinel = self.deleted_value.as_deref().unwrap_or_default();
            Predicate::or(vec![
                Predicate::is_null(&self.column),
                Predicate::ne(&self.column, sentinel),
            ])
        } else if self.boolean_not_nullable() {
            Predicate::eq(&self.column, false)
        } else {
            Predicate::is_null(&self.column)
        }
    }

    /// The predicate selecting ONLY deleted rows (negation of the default
    /// scope)
    pub fn deleted_predicate(&self) -> Predicate {
        if self.text_with_sentinel() {
            let sentinel = self.deleted_value.as_deref().unwrap_or_default();
            Predicate::eq(&self.column, sentinel)
        } else if self.boolean_not_nullable() {
            Predicate::eq(&self.column, true)
        } else {
            Predicate::is_not_null(&self.column)
        }
    }

    /// The value written to the paranoid column when a record is deleted
    pub fn delete_now_value(&self) -> DatabaseValue {
        match self.column_type {
            ColumnType::Timestamp => DatabaseValue::Timestamp(Utc::now()),
            ColumnType::Boolean => DatabaseValue::Bool(true),
            ColumnType::Text => {
                DatabaseValue::Text(self.deleted_value.clone().unwrap_or_default())
            }
        }
    }

    /// The value written to the paranoid column when a record is recovered
    pub fn recovery_value(&self) -> DatabaseValue {
        if self.boolean_not_nullable() {
            DatabaseValue::Bool(false)
        } else {
            DatabaseValue::Null
        }
    }

    /// In-memory deletion check: the negation of the default-scope
    /// predicate evaluated against a single value. A NULL value on a Text
    /// column with a sentinel configured is NOT deleted.
    pub fn is_deleted(&self, value: &DatabaseValue) -> bool {
        if self.text_with_sentinel() {
            let sentinel = self.deleted_value.as_deref().unwrap_or_default();
            !value.is_null() && value.as_text() == Some(sentinel)
        } else if self.boolean_not_nullable() {
            *value != DatabaseValue::Bool(false)
        } else {
            !value.is_null()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_policy() {
        let config = ParanoidConfig::new();
        assert_eq!(config.retained_predicate(), Predicate::is_null("deleted_at"));
        assert_eq!(config.deleted_predicate(), Predicate::is_not_null("deleted_at"));
        assert!(matches!(config.delete_now_value(), DatabaseValue::Timestamp(_)));
        assert!(!config.is_deleted(&DatabaseValue::Null));
        assert!(config.is_deleted(&DatabaseValue::Timestamp(Utc::now())));
    }

    #[test]
    fn test_boolean_not_nullable_policy() {
        let config = ParanoidConfig::new()
            .with_column("is_deleted")
            .with_column_type(ColumnType::Boolean)
            .with_allow_nulls(false);

        // false marks a live row, true marks a deleted one
        assert_eq!(config.retained_predicate(), Predicate::eq("is_deleted", false));
        assert_eq!(config.deleted_predicate(), Predicate::eq("is_deleted", true));
        assert_eq!(config.delete_now_value(), DatabaseValue::Bool(true));
        assert_eq!(config.recovery_value(), DatabaseValue::Bool(false));
        assert!(!config.is_deleted(&DatabaseValue::Bool(false)));
        assert!(config.is_deleted(&DatabaseValue::Bool(true)));
    }

    #[test]
    fn test_nullable_boolean_falls_back_to_null_encoding() {
        let config = ParanoidConfig::new()
            .with_column("is_deleted")
            .with_column_type(ColumnType::Boolean);

        assert_eq!(config.retained_predicate(), Predicate::is_null("is_deleted"));
        assert!(!config.is_deleted(&DatabaseValue::Null));
        assert!(config.is_deleted(&DatabaseValue::Bool(true)));
    }

    #[test]
    fn test_text_sentinel_policy() {
        let config = ParanoidConfig::new()
            .with_column("status")
            .with_column_type(ColumnType::Text)
            .with_deleted_value("deleted");

        assert_eq!(
            config.retained_predicate(),
            Predicate::or(vec![
                Predicate::is_null("status"),
                Predicate::ne("status", "deleted"),
            ])
        );
        assert_eq!(config.deleted_predicate(), Predicate::eq("status", "deleted"));
        assert_eq!(config.delete_now_value(), DatabaseValue::Text("deleted".into()));

        assert!(config.is_deleted(&DatabaseValue::Text("deleted".into())));
        assert!(!config.is_deleted(&DatabaseValue::Text("active".into())));
        // NULL with a sentinel configured is NOT deleted
        assert!(!config.is_deleted(&DatabaseValue::Null));
    }

    #[test]
    fn test_validation_rejects_text_without_sentinel() {
        let config = ParanoidConfig::new()
            .with_column("status")
            .with_column_type(ColumnType::Text);
        assert!(matches!(config.validate(), Err(ParanoidError::Configuration(_))));
    }

    #[test]
    fn test_validation_rejects_sentinel_on_timestamp() {
        let config = ParanoidConfig::new().with_deleted_value("deleted");
        assert!(matches!(config.validate(), Err(ParanoidError::Configuration(_))));
    }

    #[test]
    fn test_validation_rejects_empty_column() {
        let config = ParanoidConfig::new().with_column("");
        assert!(matches!(config.validate(), Err(ParanoidError::Configuration(_))));
    }

    #[test]
    fn test_default_configuration_is_valid() {
        assert!(ParanoidConfig::default().validate().is_ok());
    }
}
