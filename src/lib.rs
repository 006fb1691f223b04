//! # paranoid-orm: Soft-Delete Record Engine
//!
//! Record types registered with a paranoid configuration are never removed
//! by a plain destroy; they are marked deleted through a configurable
//! column and hidden by a default query scope. Deleted records can be
//! listed, recovered, or permanently destroyed, with both destruction and
//! recovery cascading through dependent associations.
//!
//! The crate is built around four pieces: a column policy deciding how
//! deletion is encoded ([`config`]), a composable query scope honoring
//! that policy ([`scope`]), a lifecycle engine driving per-record
//! transitions inside backend transactions ([`lifecycle`]), and a cascade
//! engine propagating those transitions through the association graph
//! ([`cascade`]).
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use paranoid_orm::{
//!     LifecycleEngine, MemoryBackend, ParanoidConfig, Record, RecoverOptions,
//!     TypeDescriptor, TypeRegistry,
//! };
//!
//! tokio_test::block_on(async {
//!     let registry = TypeRegistry::builder()
//!         .register(TypeDescriptor::new("Widget", "widgets").with_paranoid(ParanoidConfig::new()))
//!         .build()
//!         .unwrap();
//!     let backend = Arc::new(MemoryBackend::new());
//!     let engine = LifecycleEngine::new(registry, backend.clone());
//!
//!     let mut widget = Record::new("Widget");
//!     widget.set("id", 1i64).unwrap();
//!     engine.save(&mut widget).await.unwrap();
//!
//!     // destroy hides the record without removing the row
//!     engine.destroy(&mut widget).await.unwrap();
//!     let scope = engine.scope("Widget").unwrap();
//!     assert_eq!(scope.count(engine.backend()).await.unwrap(), 0);
//!     assert_eq!(backend.row_count("widgets"), 1);
//!
//!     // recover brings it back into the default scope
//!     engine.recover(&mut widget, RecoverOptions::new()).await.unwrap();
//!     let scope = engine.scope("Widget").unwrap();
//!     assert_eq!(scope.count(engine.backend()).await.unwrap(), 1);
//! });
//! ```

pub mod association;
pub mod backends;
pub mod cascade;
pub mod config;
pub mod error;
pub mod hooks;
pub mod lifecycle;
pub mod predicate;
pub mod record;
pub mod registry;
pub mod scope;
pub mod value;

// Re-export the types most callers need
pub use association::{AssociationDescriptor, AssociationKind, AssociationTarget, DependentMode};
pub use backends::{Assignments, Backend, MemoryBackend, SaveOutcome, Selection};
pub use cascade::CascadeMode;
pub use config::{ColumnType, ParanoidConfig};
pub use error::{ParanoidError, ParanoidResult};
pub use hooks::{Hook, HookPipeline, HookSet};
pub use lifecycle::{LifecycleEngine, OperationStatus, RecoverOptions};
pub use predicate::{ComparisonOperator, Condition, Predicate, Row};
pub use record::Record;
pub use registry::{TypeDescriptor, TypeRegistry, TypeRegistryBuilder};
pub use scope::Scope;
pub use value::DatabaseValue;
