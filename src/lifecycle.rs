//! Lifecycle engine - per-record state transitions
//!
//! Three transitions: soft destroy (Active -> SoftDeleted, escalating to a
//! permanent destroy when the record is already soft-deleted), permanent
//! destroy (terminal), and recover (SoftDeleted -> Active). Each public
//! operation runs inside exactly one backend transaction spanning its whole
//! cascade; a before-hook veto or a validation reject rolls everything back
//! and is reported as a status, never as an error.

use std::sync::Arc;

use chrono::Duration;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::backends::{Backend, SaveOutcome};
use crate::cascade::{self, CascadeMode};
use crate::error::{ParanoidError, ParanoidResult};
use crate::predicate::Predicate;
use crate::record::Record;
use crate::registry::{TypeDescriptor, TypeRegistry};
use crate::scope::Scope;
use crate::value::DatabaseValue;

/// Outcome of a lifecycle operation. Expected failures are statuses;
/// storage faults surface as `ParanoidError` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    /// The transition was applied and committed
    Performed,
    /// A hook returned the failure signal. For a before-hook the whole
    /// operation rolled back; for an after-hook the mutation stands.
    Vetoed,
    /// The persistence layer rejected the save; rolled back
    Invalid(String),
}

impl OperationStatus {
    pub fn is_performed(&self) -> bool {
        matches!(self, OperationStatus::Performed)
    }
}

/// Internal flow outcome; distinguishes before- from after-hook vetoes so
/// the transaction wrapper can decide between commit and rollback.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Flow {
    Performed,
    VetoedBefore,
    VetoedAfter,
    Invalid(String),
}

/// Options for `recover`; unset fields fall back to the record type's
/// configuration
#[derive(Debug, Clone, Default)]
pub struct RecoverOptions {
    recursive: Option<bool>,
    recovery_window: Option<Option<Duration>>,
}

impl RecoverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override whether dependents are recovered too
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    /// Override the recovery window for cascading recovery
    pub fn recovery_window(mut self, window: Duration) -> Self {
        self.recovery_window = Some(Some(window));
        self
    }

    /// Remove the recovery window entirely; all deleted dependents are
    /// eligible
    pub fn unbounded_recovery_window(mut self) -> Self {
        self.recovery_window = Some(None);
        self
    }
}

/// Recover options resolved against the owning type's configuration;
/// passed unchanged through the recovery cascade
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedRecover {
    pub recursive: bool,
    pub window: Option<Duration>,
}

/// The engine driving lifecycle transitions over a frozen type registry
/// and a persistence backend
pub struct LifecycleEngine {
    registry: Arc<TypeRegistry>,
    backend: Arc<dyn Backend>,
}

impl LifecycleEngine {
    pub fn new(registry: Arc<TypeRegistry>, backend: Arc<dyn Backend>) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Build a query scope for a registered type; paranoid types come with
    /// the default "exclude deleted" predicate applied
    pub fn scope(&self, type_name: &str) -> ParanoidResult<Scope> {
        Ok(Scope::new(self.registry.get_or_fail(type_name)?))
    }

    /// Derive the record's deletion state from its paranoid column value
    pub fn is_deleted(&self, record: &Record) -> ParanoidResult<bool> {
        let descriptor = self.descriptor_for(record)?;
        let config = descriptor
            .paranoid()
            .ok_or_else(|| ParanoidError::NotParanoid(descriptor.name().to_string()))?;
        Ok(config.is_deleted(record.get(config.column())))
    }

    /// Persist a record through the backend's validated save path
    pub async fn save(&self, record: &mut Record) -> ParanoidResult<OperationStatus> {
        let descriptor = self.descriptor_for(record)?;
        match self
            .backend
            .save(descriptor.table(), descriptor.primary_key(), record.fields())
            .await?
        {
            SaveOutcome::Saved => {
                record.mark_persisted();
                Ok(OperationStatus::Performed)
            }
            SaveOutcome::Invalid(reason) => Ok(OperationStatus::Invalid(reason)),
        }
    }

    /// Soft destroy: mark the record deleted, cascading per configuration.
    /// Destroying an already-soft-deleted record escalates to a permanent
    /// destroy.
    pub async fn destroy(&self, record: &mut Record) -> ParanoidResult<OperationStatus> {
        self.backend.begin_transaction().await?;
        let flow = self.destroy_flow(record).await;
        self.finish(flow).await
    }

    /// Permanent destroy: cascade a full destroy through dependents,
    /// physically delete the row, and freeze the record. Terminal.
    pub async fn destroy_fully(&self, record: &mut Record) -> ParanoidResult<OperationStatus> {
        self.backend.begin_transaction().await?;
        let flow = self.destroy_fully_flow(record).await;
        self.finish(flow).await
    }

    /// Recover a soft-deleted record, optionally cascading recovery to
    /// dependents deleted within the recovery window
    pub async fn recover(
        &self,
        record: &mut Record,
        options: RecoverOptions,
    ) -> ParanoidResult<OperationStatus> {
        let descriptor = self.descriptor_for(record)?;
        let config = descriptor
            .paranoid()
            .ok_or_else(|| ParanoidError::NotParanoid(descriptor.name().to_string()))?;
        let resolved = ResolvedRecover {
            recursive: options
                .recursive
                .unwrap_or_else(|| config.recover_dependent_associations()),
            window: options
                .recovery_window
                .unwrap_or_else(|| config.dependent_recovery_window()),
        };

        self.backend.begin_transaction().await?;
        let flow = self.recover_flow(record, resolved).await;
        self.finish(flow).await
    }

    /// Commit or roll back the ambient transaction according to the flow
    /// outcome. An after-hook veto commits: the core mutation has already
    /// been applied by contract.
    async fn finish(&self, flow: ParanoidResult<Flow>) -> ParanoidResult<OperationStatus> {
        match flow {
            Ok(Flow::Performed) => {
                self.backend.commit().await?;
                Ok(OperationStatus::Performed)
            }
            Ok(Flow::VetoedAfter) => {
                self.backend.commit().await?;
                Ok(OperationStatus::Vetoed)
            }
            Ok(Flow::VetoedBefore) => {
                self.backend.rollback().await?;
                Ok(OperationStatus::Vetoed)
            }
            Ok(Flow::Invalid(reason)) => {
                self.backend.rollback().await?;
                Ok(OperationStatus::Invalid(reason))
            }
            Err(err) => {
                if let Err(rollback_err) = self.backend.rollback().await {
                    warn!(error = %rollback_err, "rollback failed after operation error");
                }
                Err(err)
            }
        }
    }

    pub(crate) fn descriptor_for(&self, record: &Record) -> ParanoidResult<Arc<TypeDescriptor>> {
        self.registry.get_or_fail(record.type_name())
    }

    fn primary_key_value(
        &self,
        descriptor: &TypeDescriptor,
        record: &Record,
    ) -> ParanoidResult<DatabaseValue> {
        let id = record.value_of(descriptor.primary_key());
        if id.is_null() {
            return Err(ParanoidError::MissingPrimaryKey(descriptor.name().to_string()));
        }
        Ok(id)
    }

    /// Soft-destroy flow inside the ambient transaction. Boxed so the
    /// cascade can recurse through it.
    pub(crate) fn destroy_flow<'a>(
        &'a self,
        record: &'a mut Record,
    ) -> BoxFuture<'a, ParanoidResult<Flow>> {
        Box::pin(async move {
            let descriptor = self.descriptor_for(record)?;
            let config = descriptor
                .paranoid()
                .ok_or_else(|| ParanoidError::NotParanoid(descriptor.name().to_string()))?
                .clone();

            // destroying an already-deleted record removes it for good
            if config.is_deleted(record.get(config.column())) {
                return self.destroy_fully_flow(record).await;
            }

            debug!(record_type = %descriptor.name(), "soft destroy");

            if config.dependent_destroy_paranoid_only() {
                if !descriptor.hooks().soft_destroy.run_before(record) {
                    warn!(record_type = %descriptor.name(), "soft destroy vetoed by before-hook");
                    return Ok(Flow::VetoedBefore);
                }

                cascade::cascade_destroy(self, record, &descriptor, CascadeMode::SoftDestroy)
                    .await?;

                let previous = record.value_of(config.column());
                record.set(config.column(), config.delete_now_value())?;
                if record.is_persisted() {
                    match self
                        .backend
                        .save(descriptor.table(), descriptor.primary_key(), record.fields())
                        .await?
                    {
                        SaveOutcome::Saved => {}
                        SaveOutcome::Invalid(reason) => {
                            warn!(record_type = %descriptor.name(), %reason, "soft destroy failed validation");
                            record.set(config.column(), previous)?;
                            return Ok(Flow::Invalid(reason));
                        }
                    }
                }

                if !descriptor.hooks().soft_destroy.run_after(record) {
                    return Ok(Flow::VetoedAfter);
                }
            } else {
                if !descriptor.hooks().destroy.run_before(record) {
                    warn!(record_type = %descriptor.name(), "destroy vetoed by before-hook");
                    return Ok(Flow::VetoedBefore);
                }

                // mark the stored row through the bulk path: no cascade, no
                // validation save, just the column flip plus the matching
                // in-memory value
                if record.is_persisted() {
                    let id = self.primary_key_value(&descriptor, record)?;
                    Scope::new(descriptor.clone())
                        .delete_all_soft(
                            self.backend(),
                            Some(Predicate::eq(descriptor.primary_key(), id)),
                        )
                        .await?;
                }
                record.set(config.column(), config.delete_now_value())?;

                if !descriptor.hooks().destroy.run_after(record) {
                    return Ok(Flow::VetoedAfter);
                }
            }

            Ok(Flow::Performed)
        })
    }

    /// Permanent-destroy flow inside the ambient transaction. The cascade
    /// runs before the destroy hook pipeline; a before-hook veto therefore
    /// rolls the cascade back with everything else.
    pub(crate) fn destroy_fully_flow<'a>(
        &'a self,
        record: &'a mut Record,
    ) -> BoxFuture<'a, ParanoidResult<Flow>> {
        Box::pin(async move {
            let descriptor = self.descriptor_for(record)?;
            let config = descriptor
                .paranoid()
                .ok_or_else(|| ParanoidError::NotParanoid(descriptor.name().to_string()))?
                .clone();

            debug!(record_type = %descriptor.name(), "permanent destroy");

            cascade::cascade_destroy(self, record, &descriptor, CascadeMode::FullDestroy).await?;

            if !descriptor.hooks().destroy.run_before(record) {
                warn!(record_type = %descriptor.name(), "permanent destroy vetoed by before-hook");
                return Ok(Flow::VetoedBefore);
            }

            // deleting an already-absent row is a storage-level no-op
            if record.is_persisted() {
                let id = self.primary_key_value(&descriptor, record)?;
                Scope::new(descriptor.clone())
                    .delete_all_permanently(
                        self.backend(),
                        Some(Predicate::eq(descriptor.primary_key(), id)),
                    )
                    .await?;
            }

            if !record.is_frozen() {
                record.set(config.column(), config.delete_now_value())?;
            }
            record.mark_destroyed();
            record.freeze();

            if !descriptor.hooks().destroy.run_after(record) {
                return Ok(Flow::VetoedAfter);
            }
            Ok(Flow::Performed)
        })
    }

    /// Recover flow inside the ambient transaction; `options` were
    /// resolved at the top level and pass through the cascade unchanged
    pub(crate) fn recover_flow<'a>(
        &'a self,
        record: &'a mut Record,
        options: ResolvedRecover,
    ) -> BoxFuture<'a, ParanoidResult<Flow>> {
        Box::pin(async move {
            let descriptor = self.descriptor_for(record)?;
            let config = descriptor
                .paranoid()
                .ok_or_else(|| ParanoidError::NotParanoid(descriptor.name().to_string()))?
                .clone();

            debug!(record_type = %descriptor.name(), recursive = options.recursive, "recover");

            if !descriptor.hooks().recover.run_before(record) {
                warn!(record_type = %descriptor.name(), "recover vetoed by before-hook");
                return Ok(Flow::VetoedBefore);
            }

            let original = record.value_of(config.column());
            record.set(config.column(), config.recovery_value())?;
            if record.is_persisted() {
                match self
                    .backend
                    .save(descriptor.table(), descriptor.primary_key(), record.fields())
                    .await?
                {
                    SaveOutcome::Saved => {}
                    SaveOutcome::Invalid(reason) => {
                        warn!(record_type = %descriptor.name(), %reason, "recover failed validation");
                        record.set(config.column(), original)?;
                        return Ok(Flow::Invalid(reason));
                    }
                }
            }

            if options.recursive {
                cascade::cascade_recover(self, record, &descriptor, &original, options).await?;
            }

            if !descriptor.hooks().recover.run_after(record) {
                return Ok(Flow::VetoedAfter);
            }
            Ok(Flow::Performed)
        })
    }
}
