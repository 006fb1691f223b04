//! In-memory backend implementation for development and testing
//!
//! Tables are plain vectors of rows; transactions snapshot the whole store
//! and restore it on rollback. Per-table validators emulate
//! persistence-layer validation for `save`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::backends::core::{Assignments, Backend, SaveOutcome, Selection};
use crate::error::{ParanoidError, ParanoidResult};
use crate::predicate::Row;
use crate::value::DatabaseValue;

/// Validation callback run on every save into a table
pub type Validator = Arc<dyn Fn(&Row) -> Result<(), String> + Send + Sync>;

type Tables = HashMap<String, Vec<Row>>;

/// In-memory storage backend
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    snapshots: Mutex<Vec<Tables>>,
    validators: Mutex<HashMap<String, Validator>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a row directly, bypassing validation (test setup)
    pub fn insert(&self, table: &str, row: Row) {
        let mut tables = self.tables.lock().unwrap();
        tables.entry(table.to_string()).or_default().push(row);
    }

    /// Install a validator run on every save into `table`
    pub fn set_validator<F>(&self, table: &str, validator: F)
    where
        F: Fn(&Row) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators
            .lock()
            .unwrap()
            .insert(table.to_string(), Arc::new(validator));
    }

    /// Snapshot of all rows currently in `table` (test inspection)
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of rows currently in `table`
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch(&self, selection: &Selection) -> ParanoidResult<Vec<Row>> {
        let tables = self.tables.lock().unwrap();
        let rows = tables
            .get(&selection.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| selection.predicate.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn execute_update(
        &self,
        selection: &Selection,
        assignments: &Assignments,
    ) -> ParanoidResult<u64> {
        let mut tables = self.tables.lock().unwrap();
        let mut affected = 0;
        if let Some(rows) = tables.get_mut(&selection.table) {
            for row in rows.iter_mut() {
                if selection.predicate.matches(row) {
                    for (column, value) in assignments {
                        row.insert(column.clone(), value.clone());
                    }
                    affected += 1;
                }
            }
        }
        debug!(table = %selection.table, affected, "bulk update");
        Ok(affected)
    }

    async fn execute_delete(&self, selection: &Selection) -> ParanoidResult<u64> {
        let mut tables = self.tables.lock().unwrap();
        let mut removed = 0;
        if let Some(rows) = tables.get_mut(&selection.table) {
            let before = rows.len();
            rows.retain(|row| !selection.predicate.matches(row));
            removed = (before - rows.len()) as u64;
        }
        debug!(table = %selection.table, removed, "bulk delete");
        Ok(removed)
    }

    async fn save(&self, table: &str, primary_key: &str, row: &Row) -> ParanoidResult<SaveOutcome> {
        if let Some(validator) = self.validators.lock().unwrap().get(table) {
            if let Err(reason) = validator(row) {
                return Ok(SaveOutcome::Invalid(reason));
            }
        }

        let id = row.get(primary_key).cloned().unwrap_or(DatabaseValue::Null);
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.to_string()).or_default();
        match rows
            .iter_mut()
            .find(|existing| !id.is_null() && existing.get(primary_key) == Some(&id))
        {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
        Ok(SaveOutcome::Saved)
    }

    async fn begin_transaction(&self) -> ParanoidResult<()> {
        let tables = self.tables.lock().unwrap().clone();
        self.snapshots.lock().unwrap().push(tables);
        debug!("transaction begun");
        Ok(())
    }

    async fn commit(&self) -> ParanoidResult<()> {
        self.snapshots
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ParanoidError::Transaction("commit without transaction".to_string()))?;
        debug!("transaction committed");
        Ok(())
    }

    async fn rollback(&self) -> ParanoidResult<()> {
        let snapshot = self
            .snapshots
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| ParanoidError::Transaction("rollback without transaction".to_string()))?;
        *self.tables.lock().unwrap() = snapshot;
        debug!("transaction rolled back");
        Ok(())
    }
}
