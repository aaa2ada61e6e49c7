// src/cache/fill.rs

//! Ingestion: filling the tree from disk, forced rebuilds and watcher input.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cache::{FileStream, SourceCache};
use crate::errors::{Result, SrcTreeError};
use crate::fs::FileSystem;
use crate::path_utils::{make_absolute, normalize_lexically, to_native};
use crate::source::{SourceEntry, read_sources};
use crate::types::{SourceOptions, Timestamp};
use crate::watch::WatchEvent;

/// Upper bound on touches in flight at once.
const MAX_CONCURRENT_TOUCHES: usize = 16;

/// Entries buffered between the blocking reader and the tree.
const FILL_CHANNEL_CAPACITY: usize = 256;

impl SourceCache {
    /// Read files off disk into the tree and return them, payload included.
    ///
    /// Outside `add_mode` this takes the changed-path set. After the first
    /// fill, a watch session reads only those paths and stamps them with the
    /// current time; a one-shot run rescans `patterns` but skips files not
    /// modified since the previous fill. `add_mode` always reads `patterns`
    /// in full and leaves the fill bookkeeping alone.
    ///
    /// The tree is only updated once the whole read succeeded. A failed read
    /// leaves the tree, the changed set and the last-fill stamp as they were.
    pub async fn fill_cache<S: AsRef<str>>(
        &mut self,
        task: &str,
        patterns: &[S],
        root_path: impl AsRef<Path>,
        add_mode: bool,
    ) -> Result<FileStream> {
        let mut read_set: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        let mut since = None;
        let mut update_mtime = false;
        let previous_fill = self.last_fill;
        let mut taken = BTreeSet::new();

        if !add_mode {
            let changed = std::mem::take(&mut self.changed);
            if let Some(last_fill) = self.last_fill {
                since = Some(last_fill);
                if self.options.watch_mode {
                    update_mtime = true;
                    since = None;
                    read_set = changed
                        .iter()
                        .map(|p| p.to_string_lossy().into_owned())
                        .collect();
                }
            }
            taken = changed;
            self.last_fill = Some(self.clock.now());
        }

        let started = Instant::now();
        if read_set.is_empty() {
            debug!(task = %task, "nothing to read; fill completes empty");
            self.reporter.end_task_src(task, started.elapsed(), 0);
            return Ok(FileStream::empty());
        }

        let mut options = SourceOptions::default()
            .with_base(make_absolute(&self.options.root, root_path.as_ref()))
            .follow(true)
            .allow_empty(true);
        options.since = since;
        let (tx, mut rx) = mpsc::channel::<SourceEntry>(FILL_CHANNEL_CAPACITY);
        let fs = Arc::clone(&self.fs);
        let root = self.options.root.clone();
        let reader = tokio::task::spawn_blocking(move || {
            read_sources(fs.as_ref(), &root, &read_set, &options, |entry| {
                // The receiver only goes away if the fill itself was dropped.
                let _ = tx.blocking_send(entry);
            })
        });

        let now = self.clock.now();
        let mut files = Vec::new();
        while let Some(entry) = rx.recv().await {
            if entry.is_dir {
                continue;
            }
            let mut record = entry.into_record();
            record.path = to_native(&record.path);
            if update_mtime {
                record.mtime = now;
            }
            files.push(record);
        }

        let read = reader
            .await
            .map_err(|e| SrcTreeError::Other(anyhow!("source reader task failed: {e}")))
            .and_then(|inner| inner);
        if let Err(err) = read {
            warn!(task = %task, error = %err, "fill failed; cache left unchanged");
            self.changed.extend(taken);
            self.last_fill = previous_fill;
            return Err(err);
        }

        for record in &files {
            self.insert_with_aliases(record.without_contents());
        }

        info!(
            task = %task,
            files = files.len(),
            cached = self.tree.file_count(),
            "fill complete"
        );
        self.reporter
            .end_task_src(task, started.elapsed(), files.len());
        Ok(FileStream::new(files))
    }

    /// Queue `path` to be touched (or marked changed) by the next
    /// [`touch_all_files`](Self::touch_all_files).
    pub fn reprocess_file_on_next_build(&mut self, path: impl AsRef<Path>) {
        let path = make_absolute(&self.options.root, path.as_ref());
        debug!(?path, "queued file for reprocessing");
        self.files_to_touch.push(path);
    }

    /// Apply the forced-rebuild list and clear it.
    ///
    /// One-shot runs, and the first call of a watch session, touch every
    /// listed file. Later calls in a watch session add them to the changed
    /// set instead.
    pub async fn touch_all_files(&mut self) -> Result<()> {
        let files = std::mem::take(&mut self.files_to_touch);

        if self.options.watch_mode && self.has_touched_files {
            info!(count = files.len(), "in watch mode adding files to changed list");
            self.changed.extend(files);
            return Ok(());
        }

        self.has_touched_files = true;
        info!(count = files.len(), "touching files so they will be rebuilt");
        touch_batch(Arc::clone(&self.fs), files).await
    }

    /// Apply one watcher notification.
    pub fn handle_watch_event(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Changed(path) | WatchEvent::Added(path) => {
                let path = make_absolute(&self.options.root, &normalize_lexically(&path));
                debug!(?path, "path marked changed");
                self.changed.insert(path);
            }
            WatchEvent::Removed(path) => self.remove_file(path),
        }
    }

    /// Current time from the cache's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

/// Touch every path with bounded concurrency. All touches run to completion;
/// the first failure is reported along with how many failed.
async fn touch_batch(fs: Arc<dyn FileSystem>, files: Vec<PathBuf>) -> Result<()> {
    let mut set = JoinSet::new();
    let mut first_failure: Option<(PathBuf, anyhow::Error)> = None;
    let mut failed = 0usize;

    let mut record = |outcome: (PathBuf, anyhow::Result<()>)| {
        if let (path, Err(err)) = outcome {
            warn!(?path, error = %err, "touch failed");
            failed += 1;
            first_failure.get_or_insert((path, err));
        }
    };

    for path in files {
        if set.len() >= MAX_CONCURRENT_TOUCHES {
            if let Some(joined) = set.join_next().await {
                record(joined.map_err(|e| SrcTreeError::Other(anyhow!("touch task failed: {e}")))?);
            }
        }
        let fs = Arc::clone(&fs);
        set.spawn_blocking(move || {
            let result = fs.touch(&path);
            (path, result)
        });
    }

    while let Some(joined) = set.join_next().await {
        record(joined.map_err(|e| SrcTreeError::Other(anyhow!("touch task failed: {e}")))?);
    }

    match first_failure {
        Some((path, source)) => Err(SrcTreeError::Touch {
            path,
            failed,
            source,
        }),
        None => Ok(()),
    }
}
