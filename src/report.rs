// src/report.rs

//! Completion reports for source reads.
//!
//! Every fill and every source query ends by telling the host how many files
//! it produced and how long the scan took. The default reporter just logs.

use std::fmt::Debug;
use std::time::Duration;

use tracing::info;

pub trait TaskReporter: Send + Sync + Debug {
    fn end_task_src(&self, task: &str, elapsed: Duration, file_count: usize);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl TaskReporter for TracingReporter {
    fn end_task_src(&self, task: &str, elapsed: Duration, file_count: usize) {
        info!(
            task = %task,
            files = file_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "source read finished"
        );
    }
}
