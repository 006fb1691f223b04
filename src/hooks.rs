//! Before/after hook pipelines for lifecycle operations
//!
//! Hooks are plain ordered lists of callbacks with terminator semantics:
//! a callback returning `false` halts the remaining hooks and vetoes the
//! operation. Before-hooks veto before any mutation; an after-hook veto is
//! reported but the already-applied mutation stands.

use std::fmt;
use std::sync::Arc;

use crate::record::Record;

/// A single hook callback; `false` vetoes the operation
pub type Hook = Arc<dyn Fn(&mut Record) -> bool + Send + Sync>;

/// Ordered before/after callbacks for one lifecycle operation
#[derive(Clone, Default)]
pub struct HookPipeline {
    before: Vec<Hook>,
    after: Vec<Hook>,
}

impl HookPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_before(&mut self, hook: Hook) {
        self.before.push(hook);
    }

    pub fn add_after(&mut self, hook: Hook) {
        self.after.push(hook);
    }

    /// Run before-hooks in registration order; stops at the first veto
    pub fn run_before(&self, record: &mut Record) -> bool {
        self.before.iter().all(|hook| hook(record))
    }

    /// Run after-hooks in registration order; stops at the first veto
    pub fn run_after(&self, record: &mut Record) -> bool {
        self.after.iter().all(|hook| hook(record))
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

impl fmt::Debug for HookPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookPipeline")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

/// Hook pipelines for the three lifecycle operations of a record type
#[derive(Clone, Default, Debug)]
pub struct HookSet {
    pub destroy: HookPipeline,
    pub soft_destroy: HookPipeline,
    pub recover: HookPipeline,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record() -> Record {
        Record::new("Widget")
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pipeline = HookPipeline::new();
        for label in ["first", "second", "third"] {
            let calls = calls.clone();
            pipeline.add_before(Arc::new(move |_| {
                calls.lock().unwrap().push(label);
                true
            }));
        }

        assert!(pipeline.run_before(&mut record()));
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_veto_halts_remaining_hooks() {
        let ran_after_veto = Arc::new(AtomicUsize::new(0));
        let mut pipeline = HookPipeline::new();
        pipeline.add_before(Arc::new(|_| false));
        {
            let ran = ran_after_veto.clone();
            pipeline.add_before(Arc::new(move |_| {
                ran.fetch_add(1, Ordering::SeqCst);
                true
            }));
        }

        assert!(!pipeline.run_before(&mut record()));
        assert_eq!(ran_after_veto.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_pipeline_passes() {
        let pipeline = HookPipeline::new();
        assert!(pipeline.run_before(&mut record()));
        assert!(pipeline.run_after(&mut record()));
        assert!(pipeline.is_empty());
    }
}
