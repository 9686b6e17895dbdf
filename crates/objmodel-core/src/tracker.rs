//! Missing-field tracking and dump mode
//!
//! Every instance remembers which declared fields were never supplied.
//! While dump mode is on, reads of those fields report the missing sentinel
//! so the serializer leaves them out.
//!
//! Dump mode is a counter rather than a flag: each guard covering an
//! instance adds one and removes it on drop. An instance shared by two
//! trees that are dumped at the same time stays in dump mode until both
//! guards are gone.

use crate::instance::Model;
use indexmap::IndexSet;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Per-instance tracking state
#[derive(Debug, Default)]
pub struct FieldTracker {
    lock: ReentrantMutex<()>,
    missing: Mutex<IndexSet<String>>,
    dump_depth: AtomicUsize,
}

impl FieldTracker {
    pub fn new(missing: IndexSet<String>) -> Self {
        Self {
            lock: ReentrantMutex::new(()),
            missing: Mutex::new(missing),
            dump_depth: AtomicUsize::new(0),
        }
    }

    /// Take the instance lock; re-entrant on the same thread
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    pub fn is_missing(&self, name: &str) -> bool {
        self.missing.lock().contains(name)
    }

    /// Remove `name` from the missing set. Returns whether it was there.
    pub fn mark_set(&self, name: &str) -> bool {
        let _guard = self.lock();
        self.missing.lock().shift_remove(name)
    }

    pub fn missing(&self) -> Vec<String> {
        self.missing.lock().iter().cloned().collect()
    }

    pub fn is_dump_mode(&self) -> bool {
        self.dump_depth.load(Ordering::SeqCst) > 0
    }

    fn enter(&self) {
        self.dump_depth.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        // saturates at zero
        let _ = self
            .dump_depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| depth.checked_sub(1));
    }
}

/// Scoped dump mode over an instance and every model reachable through its
/// declared fields. Holds the root's lock for its whole lifetime, so
/// concurrent dumps of one instance run one after the other.
pub struct DumpModeGuard<'a> {
    _lock: ReentrantMutexGuard<'a, ()>,
    covered: Vec<Model>,
}

impl<'a> DumpModeGuard<'a> {
    pub fn engage(model: &'a Model) -> Self {
        let lock = model.tracker().lock();
        let covered = collect_tree(model);
        for node in &covered {
            node.tracker().enter();
        }
        trace!(
            model = model.class().name(),
            covered = covered.len(),
            "dump mode on"
        );
        Self {
            _lock: lock,
            covered,
        }
    }
}

impl Drop for DumpModeGuard<'_> {
    fn drop(&mut self) {
        for node in &self.covered {
            node.tracker().exit();
        }
    }
}

/// The model and all models nested below it, each once
pub(crate) fn collect_tree(root: &Model) -> Vec<Model> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(model) = stack.pop() {
        if !seen.insert(model.id()) {
            continue;
        }
        stack.extend(model.nested_models());
        out.push(model);
    }
    out
}
