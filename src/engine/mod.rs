// src/engine/mod.rs

//! Watch-session engine.
//!
//! A session keeps one [`SourceCache`] alive, applies watcher and task
//! events to it, and re-runs every configured task's source query after each
//! batch of changes.
//!
//! The pure state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;

use crate::cache::{FileStream, SourceCache, TaskEvent};
use crate::config::TaskConfig;
use crate::watch::WatchEvent;

pub mod core;
pub mod runtime;

pub use core::SessionCore;
pub use runtime::{BatchOutcome, Runtime};

/// Events flowing into the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A path changed on disk.
    Watch(WatchEvent),
    /// A task finished or failed outside the session.
    Task(TaskEvent),
    /// Every event queued so far has been delivered.
    BatchEnd,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// What the IO shell should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    ApplyWatch(WatchEvent),
    ApplyTask(TaskEvent),
    /// Re-fill the cache and re-run every task's source query.
    Rebuild,
    RequestExit,
}

/// Result of feeding one event to the core.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

/// Files one task would process in a rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: String,
    pub files: Vec<PathBuf>,
}

/// Run the source query a task is configured for.
pub fn query_task(cache: &mut SourceCache, name: &str, task: &TaskConfig) -> FileStream {
    let options = task.source_options();
    if task.all_or_nothing {
        cache.cache_all_src(name, &task.src, &options)
    } else {
        cache.cache_src(name, &task.src, &options)
    }
}
