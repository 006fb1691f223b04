//! Scope engine - composable query views over a record type
//!
//! A scope is a lazy list of predicates over one type's table. Paranoid
//! types start out with the default "exclude deleted" predicate applied;
//! `with_deleted` removes it, `without_deleted` re-applies it exactly once,
//! and `only_deleted` swaps it for its negation. The two `delete_all`
//! variants are the bulk paths: no hooks, no cascade, one storage call.

use std::sync::Arc;

use tracing::debug;

use crate::backends::{Assignments, Backend, Selection};
use crate::error::{ParanoidError, ParanoidResult};
use crate::predicate::Predicate;
use crate::record::Record;
use crate::registry::TypeDescriptor;

/// A lazy, composable query scope for one record type
#[derive(Clone)]
pub struct Scope {
    descriptor: Arc<TypeDescriptor>,
    predicates: Vec<Predicate>,
}

impl Scope {
    /// Create a scope with the default "exclude deleted" predicate applied
    /// (for paranoid types; other types start unfiltered)
    pub fn new(descriptor: Arc<TypeDescriptor>) -> Self {
        let predicates = match descriptor.paranoid() {
            Some(config) => vec![config.retained_predicate()],
            None => Vec::new(),
        };
        Self {
            descriptor,
            predicates,
        }
    }

    /// Create a scope with no predicates at all
    pub fn unscoped(descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            descriptor,
            predicates: Vec::new(),
        }
    }

    /// The descriptor this scope queries
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Add a predicate to the scope
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Remove the default "exclude deleted" predicate, returning all rows
    pub fn with_deleted(mut self) -> Self {
        if let Some(config) = self.descriptor.paranoid() {
            let default = config.retained_predicate();
            self.predicates.retain(|p| *p != default);
        }
        self
    }

    /// Ensure the default "exclude deleted" predicate is applied exactly
    /// once
    pub fn without_deleted(mut self) -> Self {
        if let Some(config) = self.descriptor.paranoid() {
            let default = config.retained_predicate();
            if !self.predicates.contains(&default) {
                self.predicates.push(default);
            }
        }
        self
    }

    /// Replace the default predicate with its negation, selecting only
    /// deleted rows
    pub fn only_deleted(self) -> Self {
        match self.descriptor.paranoid() {
            Some(config) => {
                let deleted = config.deleted_predicate();
                self.with_deleted().filter(deleted)
            }
            None => self,
        }
    }

    /// The selection this scope resolves to
    pub fn selection(&self) -> Selection {
        let predicate = match self.predicates.len() {
            0 => Predicate::All,
            1 => self.predicates[0].clone(),
            _ => Predicate::and(self.predicates.clone()),
        };
        Selection::new(self.descriptor.table(), predicate)
    }

    /// Fetch all records matching the scope
    pub async fn fetch(&self, backend: &dyn Backend) -> ParanoidResult<Vec<Record>> {
        let rows = backend.fetch(&self.selection()).await?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(self.descriptor.name(), row))
            .collect())
    }

    /// Count records matching the scope
    pub async fn count(&self, backend: &dyn Backend) -> ParanoidResult<usize> {
        Ok(backend.fetch(&self.selection()).await?.len())
    }

    /// Fetch the first record matching the scope
    pub async fn first(&self, backend: &dyn Backend) -> ParanoidResult<Option<Record>> {
        Ok(self.fetch(backend).await?.into_iter().next())
    }

    /// Physically remove every row matching this scope plus `conditions`,
    /// ignoring paranoid scoping entirely. No hooks fire.
    pub async fn delete_all_permanently(
        &self,
        backend: &dyn Backend,
        conditions: Option<Predicate>,
    ) -> ParanoidResult<u64> {
        let mut scope = self.clone().with_deleted();
        if let Some(predicate) = conditions {
            scope = scope.filter(predicate);
        }
        let removed = backend.execute_delete(&scope.selection()).await?;
        debug!(table = %self.descriptor.table(), removed, "permanent bulk delete");
        Ok(removed)
    }

    /// Bulk-mark every row matching this scope plus `conditions` as
    /// deleted by writing the deleted-now value. No hooks fire, no cascade
    /// runs, no validation happens.
    pub async fn delete_all_soft(
        &self,
        backend: &dyn Backend,
        conditions: Option<Predicate>,
    ) -> ParanoidResult<u64> {
        let config = self
            .descriptor
            .paranoid()
            .ok_or_else(|| ParanoidError::NotParanoid(self.descriptor.name().to_string()))?;

        let mut scope = self.clone();
        if let Some(predicate) = conditions {
            scope = scope.filter(predicate);
        }
        let mut assignments = Assignments::new();
        assignments.insert(config.column().to_string(), config.delete_now_value());
        let affected = backend.execute_update(&scope.selection(), &assignments).await?;
        debug!(table = %self.descriptor.table(), affected, "soft bulk delete");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryBackend;
    use crate::config::{ColumnType, ParanoidConfig};
    use crate::predicate::Row;
    use crate::registry::TypeRegistry;
    use crate::value::DatabaseValue;

    fn paranoid_descriptor() -> Arc<TypeDescriptor> {
        let registry = TypeRegistry::builder()
            .register(TypeDescriptor::new("Widget", "widgets").with_paranoid(ParanoidConfig::new()))
            .build()
            .unwrap();
        registry.get_or_fail("Widget").unwrap()
    }

    fn widget_row(id: i64, deleted_at: DatabaseValue) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), DatabaseValue::Int(id));
        row.insert("deleted_at".to_string(), deleted_at);
        row
    }

    #[test]
    fn test_without_deleted_is_idempotent() {
        let scope = Scope::new(paranoid_descriptor())
            .without_deleted()
            .without_deleted();
        // the default predicate appears exactly once
        assert_eq!(scope.selection().predicate, Predicate::is_null("deleted_at"));
    }

    #[test]
    fn test_with_deleted_removes_default_predicate() {
        let scope = Scope::new(paranoid_descriptor()).with_deleted();
        assert_eq!(scope.selection().predicate, Predicate::All);
    }

    #[test]
    fn test_only_deleted_negates_default_predicate() {
        let scope = Scope::new(paranoid_descriptor()).only_deleted();
        assert_eq!(scope.selection().predicate, Predicate::is_not_null("deleted_at"));
    }

    #[test]
    fn test_only_deleted_for_text_sentinel() {
        let registry = TypeRegistry::builder()
            .register(
                TypeDescriptor::new("Doc", "docs").with_paranoid(
                    ParanoidConfig::new()
                        .with_column("status")
                        .with_column_type(ColumnType::Text)
                        .with_deleted_value("deleted"),
                ),
            )
            .build()
            .unwrap();
        let scope = Scope::new(registry.get_or_fail("Doc").unwrap()).only_deleted();
        assert_eq!(scope.selection().predicate, Predicate::eq("status", "deleted"));
    }

    #[tokio::test]
    async fn test_fetch_applies_default_scope() {
        let backend = MemoryBackend::new();
        backend.insert("widgets", widget_row(1, DatabaseValue::Null));
        backend.insert(
            "widgets",
            widget_row(2, DatabaseValue::Timestamp(chrono::Utc::now())),
        );

        let descriptor = paranoid_descriptor();
        assert_eq!(Scope::new(descriptor.clone()).count(&backend).await.unwrap(), 1);
        assert_eq!(
            Scope::new(descriptor.clone()).with_deleted().count(&backend).await.unwrap(),
            2
        );
        assert_eq!(
            Scope::new(descriptor).only_deleted().count(&backend).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_delete_all_permanently_ignores_paranoid_scoping() {
        let backend = MemoryBackend::new();
        backend.insert("widgets", widget_row(1, DatabaseValue::Null));
        backend.insert(
            "widgets",
            widget_row(2, DatabaseValue::Timestamp(chrono::Utc::now())),
        );

        let removed = Scope::new(paranoid_descriptor())
            .delete_all_permanently(&backend, None)
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(backend.row_count("widgets"), 0);
    }

    #[tokio::test]
    async fn test_delete_all_soft_marks_only_live_rows() {
        let backend = MemoryBackend::new();
        backend.insert("widgets", widget_row(1, DatabaseValue::Null));
        backend.insert("widgets", widget_row(2, DatabaseValue::Null));

        let descriptor = paranoid_descriptor();
        let affected = Scope::new(descriptor.clone())
            .delete_all_soft(&backend, Some(Predicate::eq("id", 1i64)))
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(backend.row_count("widgets"), 2);
        assert_eq!(Scope::new(descriptor.clone()).count(&backend).await.unwrap(), 1);
        assert_eq!(
            Scope::new(descriptor).only_deleted().count(&backend).await.unwrap(),
            1
        );
    }
}
