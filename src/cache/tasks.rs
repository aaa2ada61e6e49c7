// src/cache/tasks.rs

//! Per-task run stamps.
//!
//! A source query records a *pending* stamp for its task. The stamp becomes
//! the task's committed last-run time only when the task completes; an error
//! drops it so the next run compares against the previous committed stamp
//! (or sees everything, if the task never succeeded).

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::cache::SourceCache;
use crate::types::{TaskName, Timestamp};

/// Completion signal from the task scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Completed(TaskName),
    Errored(TaskName),
}

#[derive(Debug, Clone, Default)]
pub struct TaskTimes {
    committed: BTreeMap<TaskName, Timestamp>,
    pending: HashMap<TaskName, Timestamp>,
}

impl TaskTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_committed(committed: BTreeMap<TaskName, Timestamp>) -> Self {
        Self {
            committed,
            pending: HashMap::new(),
        }
    }

    pub fn committed(&self) -> &BTreeMap<TaskName, Timestamp> {
        &self.committed
    }

    pub fn last_run(&self, task: &str) -> Option<Timestamp> {
        self.committed.get(task).copied()
    }

    pub fn pending(&self, task: &str) -> Option<Timestamp> {
        self.pending.get(task).copied()
    }

    pub fn record_pending(&mut self, task: &str, stamp: Timestamp) {
        debug!(task = %task, %stamp, "recorded pending run stamp");
        self.pending.insert(task.to_string(), stamp);
    }

    /// Promote the pending stamp. Returns false when there was none.
    pub fn commit(&mut self, task: &str) -> bool {
        match self.pending.remove(task) {
            Some(stamp) => {
                debug!(task = %task, %stamp, "committed run stamp");
                self.committed.insert(task.to_string(), stamp);
                true
            }
            None => false,
        }
    }

    /// Drop the pending stamp. Returns false when there was none.
    pub fn discard(&mut self, task: &str) -> bool {
        let dropped = self.pending.remove(task).is_some();
        if dropped {
            debug!(task = %task, "discarded pending run stamp");
        }
        dropped
    }
}

impl SourceCache {
    pub fn set_task_completed(&mut self, task: &str) {
        self.tasks.commit(task);
    }

    pub fn set_task_errored(&mut self, task: &str) {
        self.tasks.discard(task);
    }

    pub fn handle_task_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::Completed(task) => self.set_task_completed(&task),
            TaskEvent::Errored(task) => self.set_task_errored(&task),
        }
    }

    pub fn task_times(&self) -> &TaskTimes {
        &self.tasks
    }
}
