//! Type registry - per-record-type metadata resolved once at setup
//!
//! Each registered type carries its table, primary key, optional paranoid
//! column configuration, dependent association descriptors, and hook
//! pipelines. The registry is built once, validated (fail fast on
//! misconfiguration), and frozen behind an `Arc`; nothing in it mutates at
//! runtime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::association::{AssociationDescriptor, AssociationTarget, DependentMode};
use crate::config::ParanoidConfig;
use crate::error::{ParanoidError, ParanoidResult};
use crate::hooks::HookSet;
use crate::record::Record;

/// Immutable metadata for one registered record type
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    table: String,
    primary_key: String,
    paranoid: Option<ParanoidConfig>,
    associations: Vec<AssociationDescriptor>,
    hooks: HookSet,
}

impl TypeDescriptor {
    /// Create a descriptor for a type stored in `table`
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            primary_key: "id".to_string(),
            paranoid: None,
            associations: Vec::new(),
            hooks: HookSet::new(),
        }
    }

    /// Override the primary key column (defaults to "id")
    pub fn with_primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = primary_key.to_string();
        self
    }

    /// Attach a paranoid column configuration, making the type
    /// soft-delete-capable
    pub fn with_paranoid(mut self, config: ParanoidConfig) -> Self {
        self.paranoid = Some(config);
        self
    }

    /// Declare an association; cascade order follows declaration order
    pub fn with_association(mut self, association: AssociationDescriptor) -> Self {
        self.associations.push(association);
        self
    }

    /// Register a before-destroy hook
    pub fn before_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Record) -> bool + Send + Sync + 'static,
    {
        self.hooks.destroy.add_before(Arc::new(hook));
        self
    }

    /// Register an after-destroy hook
    pub fn after_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Record) -> bool + Send + Sync + 'static,
    {
        self.hooks.destroy.add_after(Arc::new(hook));
        self
    }

    /// Register a before-soft-destroy hook
    pub fn before_soft_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Record) -> bool + Send + Sync + 'static,
    {
        self.hooks.soft_destroy.add_before(Arc::new(hook));
        self
    }

    /// Register an after-soft-destroy hook
    pub fn after_soft_destroy<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Record) -> bool + Send + Sync + 'static,
    {
        self.hooks.soft_destroy.add_after(Arc::new(hook));
        self
    }

    /// Register a before-recover hook
    pub fn before_recover<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Record) -> bool + Send + Sync + 'static,
    {
        self.hooks.recover.add_before(Arc::new(hook));
        self
    }

    /// Register an after-recover hook
    pub fn after_recover<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Record) -> bool + Send + Sync + 'static,
    {
        self.hooks.recover.add_after(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// The paranoid configuration, if this type is soft-delete-capable
    pub fn paranoid(&self) -> Option<&ParanoidConfig> {
        self.paranoid.as_ref()
    }

    /// Whether this type supports soft deletes
    pub fn is_paranoid(&self) -> bool {
        self.paranoid.is_some()
    }

    /// All declared associations, in declaration order
    pub fn associations(&self) -> &[AssociationDescriptor] {
        &self.associations
    }

    /// Associations carrying a dependency mode, in declaration order
    pub fn dependent_associations(
        &self,
    ) -> impl Iterator<Item = (&AssociationDescriptor, DependentMode)> {
        self.associations
            .iter()
            .filter_map(|a| a.dependent.map(|mode| (a, mode)))
    }

    pub(crate) fn hooks(&self) -> &HookSet {
        &self.hooks
    }

    fn validate(&self) -> ParanoidResult<()> {
        if self.name.is_empty() || self.table.is_empty() {
            return Err(ParanoidError::Configuration(
                "record type requires a name and a table".to_string(),
            ));
        }
        if let Some(config) = &self.paranoid {
            config.validate()?;
        }
        for association in &self.associations {
            association.validate()?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("paranoid", &self.paranoid)
            .field("associations", &self.associations)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Frozen map of type name to descriptor
pub struct TypeRegistry {
    types: HashMap<String, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// Look up a descriptor by type name
    pub fn get(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        self.types.get(name).cloned()
    }

    /// Look up a descriptor or fail with `UnknownType`
    pub fn get_or_fail(&self, name: &str) -> ParanoidResult<Arc<TypeDescriptor>> {
        self.get(name)
            .ok_or_else(|| ParanoidError::UnknownType(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builder collecting descriptors before the registry is frozen
#[derive(Default)]
pub struct TypeRegistryBuilder {
    types: Vec<TypeDescriptor>,
}

impl TypeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type descriptor
    pub fn register(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.push(descriptor);
        self
    }

    /// Validate every descriptor and static association target, then
    /// freeze the registry. Polymorphic targets are checked at call time.
    pub fn build(self) -> ParanoidResult<Arc<TypeRegistry>> {
        let mut types = HashMap::new();
        for descriptor in &self.types {
            descriptor.validate()?;
            if types
                .insert(descriptor.name.clone(), Arc::new(descriptor.clone()))
                .is_some()
            {
                return Err(ParanoidError::Configuration(format!(
                    "record type '{}' registered twice",
                    descriptor.name
                )));
            }
        }

        for descriptor in &self.types {
            for association in &descriptor.associations {
                if let AssociationTarget::Static(target) = &association.target {
                    if !types.contains_key(target) {
                        return Err(ParanoidError::Configuration(format!(
                            "association '{}' on '{}' targets unregistered type '{}'",
                            association.name, descriptor.name, target
                        )));
                    }
                }
            }
        }

        Ok(Arc::new(TypeRegistry { types }))
    }
}
