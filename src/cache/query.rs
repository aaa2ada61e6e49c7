// src/cache/query.rs

//! Change-filtered source queries and deletion checks.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, error};

use crate::cache::{FileStream, SourceCache};
use crate::path_utils::make_absolute;
use crate::tree::FileRecord;
use crate::types::{SourceOptions, Timestamp};

impl SourceCache {
    /// Files must be modified strictly after this instant to count as changed:
    /// the later of the task's last run plus skew and `options.since`.
    /// `None` means neither is known and everything counts.
    fn change_threshold(&self, task: &str, options: &SourceOptions) -> Option<Timestamp> {
        let after_last_run = self
            .tasks
            .last_run(task)
            .map(|last| last.saturating_add(self.options.skew));
        match (after_last_run, options.since) {
            (Some(last), Some(since)) => Some(last.max(since)),
            (last, since) => last.or(since),
        }
    }

    /// Cheap check for whether `task` would see any changed source.
    pub fn has_work<S: AsRef<str>>(&self, task: &str, patterns: &[S]) -> bool {
        let Some(last_run) = self.tasks.last_run(task) else {
            return true;
        };
        if patterns.is_empty() {
            return true;
        }

        let threshold = last_run.saturating_add(self.options.skew);
        self.matching_files(patterns, &SourceOptions::default())
            .iter()
            .any(|file| file.mtime > threshold)
    }

    /// Matching files modified since `task` last completed.
    ///
    /// Records the scan's start time as the task's pending run stamp. A file
    /// stamped later than that start is logged and pushes the stamp forward.
    pub fn cache_src<S: AsRef<str>>(
        &mut self,
        task: &str,
        patterns: &[S],
        options: &SourceOptions,
    ) -> FileStream {
        let started = Instant::now();
        let threshold = self.change_threshold(task, options);
        let mut new_start = self.clock.now();

        let mut results = Vec::new();
        for file in self.matching_files(patterns, options) {
            if file.mtime > new_start {
                error!(
                    path = ?file.path,
                    start = %new_start,
                    mtime = %file.mtime,
                    "file newer than start time"
                );
                new_start = file.mtime;
            }
            if threshold.is_none_or(|t| file.mtime > t) {
                results.push(file);
            }
        }

        self.tasks.record_pending(task, new_start);
        self.reporter
            .end_task_src(task, started.elapsed(), results.len());
        FileStream::new(results)
    }

    /// Every matching file if any of them changed, otherwise nothing.
    pub fn cache_all_src<S: AsRef<str>>(
        &mut self,
        task: &str,
        patterns: &[S],
        options: &SourceOptions,
    ) -> FileStream {
        let started = Instant::now();
        let threshold = self.change_threshold(task, options);
        let new_start = self.clock.now();

        let files = self.matching_files(patterns, options);
        let any_changed = options.always_pass_through
            || threshold.is_none_or(|t| files.iter().any(|f| f.mtime > t));

        self.tasks.record_pending(task, new_start);
        let emitted = if any_changed { files } else { Vec::new() };
        debug!(task = %task, any_changed, "all-or-nothing source check");
        self.reporter
            .end_task_src(task, started.elapsed(), emitted.len());
        FileStream::new(emitted)
    }

    /// Whether the file `path` was ultimately generated from has left the
    /// cache.
    pub fn was_deleted(&self, path: impl AsRef<Path>) -> bool {
        let path = make_absolute(&self.options.root, path.as_ref());
        let root = self.deps.root_of(&path);
        self.tree.lookup(&root).is_none()
    }

    /// Cached files matching `patterns` whose dependency root is gone.
    pub fn get_deleted_files<S: AsRef<str>>(&self, patterns: &[S]) -> Vec<FileRecord> {
        if patterns.is_empty() {
            return Vec::new();
        }
        self.matching_files(patterns, &SourceOptions::default())
            .into_iter()
            .filter(|file| self.was_deleted(&file.path))
            .collect()
    }
}
