//! Cascade engine - dependent-association traversal
//!
//! Walks a record's dependent associations when a lifecycle transition
//! fires, applying the matching transition to each target. Non-paranoid
//! targets are skipped. `Destroy` dependents are loaded and recursed one
//! row at a time so their own hooks and cascades run; `DeleteAll`
//! dependents are handled with a single bulk statement and no hooks.

use tracing::warn;

use crate::association::{AssociationDescriptor, AssociationKind, AssociationTarget, DependentMode};
use crate::backends::{Assignments, Backend};
use crate::config::ColumnType;
use crate::error::ParanoidResult;
use crate::lifecycle::{Flow, LifecycleEngine, ResolvedRecover};
use crate::predicate::Predicate;
use crate::record::Record;
use crate::registry::TypeDescriptor;
use crate::scope::Scope;
use crate::value::DatabaseValue;
use std::sync::Arc;

/// Which transition is being propagated through the association graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeMode {
    /// Permanent destroy; reaches soft-deleted dependents too
    FullDestroy,
    /// Soft destroy; only live dependents are touched
    SoftDestroy,
}

/// Propagate a destroy through the owner's dependent associations
pub(crate) async fn cascade_destroy(
    engine: &LifecycleEngine,
    owner: &Record,
    descriptor: &TypeDescriptor,
    mode: CascadeMode,
) -> ParanoidResult<()> {
    for (association, dependent) in descriptor.dependent_associations() {
        let Some(target) = resolve_target(engine, owner, association)? else {
            continue;
        };
        if !target.is_paranoid() {
            continue;
        }
        let Some(link) = association_predicate(owner, descriptor, association, &target) else {
            continue;
        };

        match dependent {
            DependentMode::DeleteAll => {
                // one bulk statement across every matching row, deleted or
                // not; no hooks, no recursion
                Scope::unscoped(target.clone())
                    .filter(link)
                    .delete_all_permanently(engine.backend(), None)
                    .await?;
            }
            DependentMode::Destroy => {
                let mut scope = Scope::new(target.clone()).filter(link);
                if mode == CascadeMode::FullDestroy {
                    scope = scope.with_deleted();
                }
                let mut dependents = scope.fetch(engine.backend()).await?;
                if !association.kind.is_collection() {
                    dependents.truncate(1);
                }
                for record in &mut dependents {
                    let flow = match mode {
                        CascadeMode::FullDestroy => engine.destroy_fully_flow(record).await?,
                        CascadeMode::SoftDestroy => engine.destroy_flow(record).await?,
                    };
                    // a nested veto does not unwind the cascade
                    if flow != Flow::Performed {
                        warn!(
                            owner = %descriptor.name(),
                            association = %association.name,
                            ?flow,
                            "dependent destroy did not complete"
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

/// Propagate recovery through the owner's dependent associations. Only
/// soft-deleted dependents are eligible; when both sides track deletion by
/// timestamp and a window is set, eligibility is further narrowed to rows
/// deleted within the window around the owner's deletion time.
pub(crate) async fn cascade_recover(
    engine: &LifecycleEngine,
    owner: &Record,
    descriptor: &TypeDescriptor,
    owner_deleted_at: &DatabaseValue,
    options: ResolvedRecover,
) -> ParanoidResult<()> {
    let Some(owner_config) = descriptor.paranoid() else {
        return Ok(());
    };

    for (association, dependent) in descriptor.dependent_associations() {
        let Some(target) = resolve_target(engine, owner, association)? else {
            continue;
        };
        let Some(target_config) = target.paranoid() else {
            continue;
        };
        let Some(link) = association_predicate(owner, descriptor, association, &target) else {
            continue;
        };

        let mut scope = Scope::new(target.clone()).only_deleted().filter(link);
        if owner_config.column_type() == ColumnType::Timestamp
            && target_config.column_type() == ColumnType::Timestamp
        {
            if let (Some(window), Some(deleted_at)) =
                (options.window, owner_deleted_at.as_timestamp())
            {
                scope = scope
                    .filter(Predicate::gte(target_config.column(), deleted_at - window))
                    .filter(Predicate::lte(target_config.column(), deleted_at + window));
            }
        }

        match dependent {
            DependentMode::DeleteAll => {
                // bulk un-mark, no hooks; each row keeps nothing of its
                // deletion history
                let mut assignments = Assignments::new();
                assignments.insert(
                    target_config.column().to_string(),
                    target_config.recovery_value(),
                );
                engine
                    .backend()
                    .execute_update(&scope.selection(), &assignments)
                    .await?;
            }
            DependentMode::Destroy => {
                let mut dependents = scope.fetch(engine.backend()).await?;
                if !association.kind.is_collection() {
                    dependents.truncate(1);
                }
                for record in &mut dependents {
                    let flow = engine.recover_flow(record, options).await?;
                    if flow != Flow::Performed {
                        warn!(
                            owner = %descriptor.name(),
                            association = %association.name,
                            ?flow,
                            "dependent recovery did not complete"
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

/// Resolve the association's target type. Static targets come straight
/// from the registry; polymorphic targets read the discriminator field
/// from the owner. A NULL discriminator means no associated record.
fn resolve_target(
    engine: &LifecycleEngine,
    owner: &Record,
    association: &AssociationDescriptor,
) -> ParanoidResult<Option<Arc<TypeDescriptor>>> {
    match &association.target {
        AssociationTarget::Static(type_name) => {
            engine.registry().get_or_fail(type_name).map(Some)
        }
        AssociationTarget::Polymorphic {
            discriminator_field,
        } => match owner.get(discriminator_field) {
            DatabaseValue::Text(type_name) => engine.registry().get_or_fail(type_name).map(Some),
            DatabaseValue::Null => Ok(None),
            other => Err(crate::error::ParanoidError::UnknownType(format!(
                "discriminator field '{}' holds {:?}, expected a type name",
                discriminator_field, other
            ))),
        },
    }
}

/// The predicate linking the owner to the association's rows. `None` when
/// the linking value is NULL, in which case there is nothing to cascade to.
fn association_predicate(
    owner: &Record,
    descriptor: &TypeDescriptor,
    association: &AssociationDescriptor,
    target: &TypeDescriptor,
) -> Option<Predicate> {
    match association.kind {
        AssociationKind::HasMany | AssociationKind::HasOne => {
            let id = owner.value_of(descriptor.primary_key());
            if id.is_null() {
                warn!(
                    owner = %descriptor.name(),
                    association = %association.name,
                    "owner has no primary key value, skipping cascade"
                );
                return None;
            }
            Some(Predicate::eq(&association.foreign_key, id))
        }
        AssociationKind::BelongsTo => {
            let foreign = owner.value_of(&association.foreign_key);
            if foreign.is_null() {
                return None;
            }
            Some(Predicate::eq(target.primary_key(), foreign))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParanoidConfig;
    use crate::registry::TypeRegistry;
    use std::collections::HashMap;

    fn registry_with_parent_child() -> Arc<TypeRegistry> {
        TypeRegistry::builder()
            .register(
                TypeDescriptor::new("Parent", "parents")
                    .with_paranoid(ParanoidConfig::new())
                    .with_association(
                        AssociationDescriptor::has_many("children", "Child", "parent_id")
                            .with_dependent(DependentMode::Destroy),
                    ),
            )
            .register(TypeDescriptor::new("Child", "children").with_paranoid(ParanoidConfig::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_has_many_predicate_links_foreign_key_to_owner_id() {
        let registry = registry_with_parent_child();
        let parent = registry.get("Parent").unwrap();
        let child = registry.get("Child").unwrap();
        let association = &parent.associations()[0];

        let mut fields = HashMap::new();
        fields.insert("id".to_string(), DatabaseValue::Int(7));
        let owner = Record::from_row("Parent", fields);

        let predicate = association_predicate(&owner, &parent, association, &child).unwrap();
        assert_eq!(predicate, Predicate::eq("parent_id", 7i64));
    }

    #[test]
    fn test_has_many_predicate_is_none_without_owner_id() {
        let registry = registry_with_parent_child();
        let parent = registry.get("Parent").unwrap();
        let child = registry.get("Child").unwrap();
        let association = &parent.associations()[0];

        let owner = Record::new("Parent");
        assert!(association_predicate(&owner, &parent, association, &child).is_none());
    }

    #[test]
    fn test_belongs_to_predicate_links_target_id_to_foreign_key() {
        let registry = TypeRegistry::builder()
            .register(
                TypeDescriptor::new("Comment", "comments")
                    .with_paranoid(ParanoidConfig::new())
                    .with_association(
                        AssociationDescriptor::belongs_to("post", "Post", "post_id")
                            .with_dependent(DependentMode::Destroy),
                    ),
            )
            .register(TypeDescriptor::new("Post", "posts").with_paranoid(ParanoidConfig::new()))
            .build()
            .unwrap();
        let comment = registry.get("Comment").unwrap();
        let post = registry.get("Post").unwrap();
        let association = &comment.associations()[0];

        let mut fields = HashMap::new();
        fields.insert("post_id".to_string(), DatabaseValue::Int(3));
        let owner = Record::from_row("Comment", fields);

        let predicate = association_predicate(&owner, &comment, association, &post).unwrap();
        assert_eq!(predicate, Predicate::eq("id", 3i64));
    }
}
