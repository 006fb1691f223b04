//! Core backend traits
//!
//! The capability contract the engine consumes: predicate-filtered reads,
//! bulk updates and deletes, validated single-record saves, and a flat
//! transaction surface. Lifecycle operations open exactly one transaction
//! each; the engine is single-writer per operation, so the backend only ever
//! tracks one ambient transaction at a time.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::ParanoidResult;
use crate::predicate::{Predicate, Row};

/// A table plus the predicate selecting rows within it
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub table: String,
    pub predicate: Predicate,
}

impl Selection {
    pub fn new(table: &str, predicate: Predicate) -> Self {
        Self {
            table: table.to_string(),
            predicate,
        }
    }
}

/// Column assignments for a bulk update
pub type Assignments = HashMap<String, crate::value::DatabaseValue>;

/// Outcome of a validated save
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    /// The persistence layer rejected the record; the reason is reported
    /// back as an operation-level failure, not an error
    Invalid(String),
}

/// Persistence capability consumed by the engine
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch all rows matching the selection
    async fn fetch(&self, selection: &Selection) -> ParanoidResult<Vec<Row>>;

    /// Apply assignments to all rows matching the selection, returning the
    /// number of rows affected
    async fn execute_update(
        &self,
        selection: &Selection,
        assignments: &Assignments,
    ) -> ParanoidResult<u64>;

    /// Physically delete all rows matching the selection, returning the
    /// number of rows removed
    async fn execute_delete(&self, selection: &Selection) -> ParanoidResult<u64>;

    /// Upsert a single row keyed by `primary_key`, running any
    /// persistence-layer validation
    async fn save(&self, table: &str, primary_key: &str, row: &Row) -> ParanoidResult<SaveOutcome>;

    /// Begin the ambient transaction
    async fn begin_transaction(&self) -> ParanoidResult<()>;

    /// Commit the ambient transaction
    async fn commit(&self) -> ParanoidResult<()>;

    /// Roll back the ambient transaction, discarding every mutation made
    /// since it began
    async fn rollback(&self) -> ParanoidResult<()>;
}
