//! Dependent association descriptors
//!
//! Static metadata describing how a record type relates to its dependents
//! and what should happen to them when the owner is destroyed or recovered.
//! Polymorphic targets are resolved at call time from a discriminator field
//! on the owning record, never from a statically known type.

use serde::{Deserialize, Serialize};

use crate::error::{ParanoidError, ParanoidResult};

/// Cardinality and direction of an association
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssociationKind {
    /// One-to-many: the foreign key lives on the target
    HasMany,
    /// One-to-one: the foreign key lives on the target
    HasOne,
    /// Many-to-one: the foreign key lives on the owner
    BelongsTo,
}

impl AssociationKind {
    /// Returns true if this association returns a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany)
    }
}

/// What a lifecycle operation does to the associated records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependentMode {
    /// Recurse through the full lifecycle per row; hooks fire per row
    Destroy,
    /// One bulk operation against the association scope; no hooks fire
    DeleteAll,
}

/// How the target type of an association is determined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssociationTarget {
    /// Target type is fixed at registration time
    Static(String),
    /// Target type name is read from a field on the owning record
    Polymorphic { discriminator_field: String },
}

/// Static metadata for a single association
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationDescriptor {
    /// Name of the association (for diagnostics and ordering)
    pub name: String,
    pub kind: AssociationKind,
    pub target: AssociationTarget,
    /// Foreign key column; on the target for has-many/has-one,
    /// on the owner for belongs-to
    pub foreign_key: String,
    /// Dependency mode; `None` means lifecycle operations leave the
    /// association alone
    pub dependent: Option<DependentMode>,
}

impl AssociationDescriptor {
    /// A has-many association to a statically known type
    pub fn has_many(name: &str, target: &str, foreign_key: &str) -> Self {
        Self::new(name, AssociationKind::HasMany, AssociationTarget::Static(target.to_string()), foreign_key)
    }

    /// A has-one association to a statically known type
    pub fn has_one(name: &str, target: &str, foreign_key: &str) -> Self {
        Self::new(name, AssociationKind::HasOne, AssociationTarget::Static(target.to_string()), foreign_key)
    }

    /// A belongs-to association to a statically known type
    pub fn belongs_to(name: &str, target: &str, foreign_key: &str) -> Self {
        Self::new(name, AssociationKind::BelongsTo, AssociationTarget::Static(target.to_string()), foreign_key)
    }

    /// A polymorphic belongs-to association; the target type name is read
    /// from `discriminator_field` on the owning record when the cascade runs
    pub fn belongs_to_polymorphic(name: &str, discriminator_field: &str, foreign_key: &str) -> Self {
        Self::new(
            name,
            AssociationKind::BelongsTo,
            AssociationTarget::Polymorphic {
                discriminator_field: discriminator_field.to_string(),
            },
            foreign_key,
        )
    }

    fn new(name: &str, kind: AssociationKind, target: AssociationTarget, foreign_key: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target,
            foreign_key: foreign_key.to_string(),
            dependent: None,
        }
    }

    /// Set the dependency mode
    pub fn with_dependent(mut self, dependent: DependentMode) -> Self {
        self.dependent = Some(dependent);
        self
    }

    /// Returns true if this association is polymorphic
    pub fn is_polymorphic(&self) -> bool {
        matches!(self.target, AssociationTarget::Polymorphic { .. })
    }

    /// Validate the descriptor for consistency
    pub fn validate(&self) -> ParanoidResult<()> {
        if self.name.is_empty() {
            return Err(ParanoidError::Configuration(
                "association name must not be empty".to_string(),
            ));
        }
        if self.foreign_key.is_empty() {
            return Err(ParanoidError::Configuration(format!(
                "association '{}' requires a foreign key column",
                self.name
            )));
        }
        if self.is_polymorphic() && self.kind != AssociationKind::BelongsTo {
            return Err(ParanoidError::Configuration(format!(
                "association '{}' is polymorphic but not belongs-to",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let assoc = AssociationDescriptor::has_many("notes", "Note", "owner_id")
            .with_dependent(DependentMode::Destroy);
        assert_eq!(assoc.kind, AssociationKind::HasMany);
        assert_eq!(assoc.dependent, Some(DependentMode::Destroy));
        assert!(!assoc.is_polymorphic());
        assert!(assoc.kind.is_collection());
    }

    #[test]
    fn test_polymorphic_belongs_to() {
        let assoc = AssociationDescriptor::belongs_to_polymorphic("owner", "owner_type", "owner_id");
        assert!(assoc.is_polymorphic());
        assert!(assoc.validate().is_ok());
    }

    #[test]
    fn test_polymorphic_has_many_is_rejected() {
        let assoc = AssociationDescriptor {
            name: "items".to_string(),
            kind: AssociationKind::HasMany,
            target: AssociationTarget::Polymorphic {
                discriminator_field: "item_type".to_string(),
            },
            foreign_key: "owner_id".to_string(),
            dependent: None,
        };
        assert!(matches!(assoc.validate(), Err(ParanoidError::Configuration(_))));
    }

    #[test]
    fn test_missing_foreign_key_is_rejected() {
        let assoc = AssociationDescriptor::has_many("notes", "Note", "");
        assert!(matches!(assoc.validate(), Err(ParanoidError::Configuration(_))));
    }
}
