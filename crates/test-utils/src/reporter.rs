use std::sync::{Arc, Mutex};
use std::time::Duration;

use srctree::report::TaskReporter;

/// One `end_task_src` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcReport {
    pub task: String,
    pub file_count: usize,
}

/// Reporter that remembers every completion report. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<SrcReport>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<SrcReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<SrcReport> {
        self.reports.lock().unwrap().last().cloned()
    }

    pub fn counts_for(&self, task: &str) -> Vec<usize> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.task == task)
            .map(|r| r.file_count)
            .collect()
    }
}

impl TaskReporter for RecordingReporter {
    fn end_task_src(&self, task: &str, _elapsed: Duration, file_count: usize) {
        self.reports.lock().unwrap().push(SrcReport {
            task: task.to_string(),
            file_count,
        });
    }
}
