//! Process-local task registry.
//!
//! Holds one [`TaskEntry`] per task id behind a mutex. Readers take
//! snapshots; the controller only ever writes through [`ProgressSink`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::{ProgressSink, TaskEntry, TaskUpdate};

#[derive(Debug, Default)]
struct Inner {
    tasks: HashMap<String, TaskEntry>,
    updates: usize,
}

/// Task registry kept in memory.
///
/// Cloning shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the task `id`.
    pub fn get(&self, id: &str) -> Option<TaskEntry> {
        self.lock().tasks.get(id).cloned()
    }

    /// Snapshot of every task, ordered by id.
    pub fn tasks(&self) -> Vec<TaskEntry> {
        let mut tasks: Vec<_> = self.lock().tasks.values().cloned().collect();
        tasks.sort_by(|a, b| a.id.cmp(&b.id));
        tasks
    }

    /// Number of updates applied to known tasks.
    pub fn update_count(&self) -> usize {
        self.lock().updates
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Entries are replaced whole, so a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProgressSink for InMemoryTaskRegistry {
    fn add_task(&self, task: TaskEntry) {
        self.lock().tasks.insert(task.id.clone(), task);
    }

    fn update_task(&self, id: &str, update: TaskUpdate) {
        let mut inner = self.lock();
        if let Some(task) = inner.tasks.get_mut(id) {
            task.apply(&update);
            inner.updates += 1;
        }
    }
}
