// src/cache/mod.rs

//! The source cache context.
//!
//! [`SourceCache`] groups every piece of process-wide state the cache needs
//! (path tree, symlink aliases, task stamps, dependency graph, changed-path
//! set) together with its collaborators (filesystem, clock, reporter).
//!
//! Expected initialization order:
//! 1. [`SourceCache::new`]
//! 2. [`SourceCache::load_sections`]
//! 3. [`SourceCache::add_symlink`] for each configured alias
//! 4. [`SourceCache::touch_all_files`]
//! 5. [`SourceCache::fill_cache`]
//! 6. queries, [`SourceCache::cache_dest`] stages, watch and task events
//! 7. [`SourceCache::save_sections`] whenever the host persists state
//!
//! Operations live in:
//! - [`fill`]: ingestion, forced rebuilds and watcher events.
//! - [`query`]: change-filtered source queries and deletion checks.
//! - [`dest`]: the pass-through stage after a generation step.
//! - [`tasks`]: pending/committed run stamps.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::deps::DependencyGraph;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::glob::{SegmentMatchers, collect_matches};
use crate::path_utils::make_absolute;
use crate::report::TaskReporter;
use crate::sections::{
    FILE_DEPENDENCY_GRAPH_SECTION, FILES_TO_TOUCH_SECTION, SectionStore,
    TASK_START_TIMES_SECTION, decode, encode,
};
use crate::tree::{FileRecord, InsertOutcome, PathTree, SymlinkTable};
use crate::types::{DEFAULT_SKEW, SourceOptions, TaskName, Timestamp};

pub mod dest;
pub mod fill;
pub mod query;
pub mod stream;
pub mod tasks;

pub use stream::FileStream;
pub use tasks::{TaskEvent, TaskTimes};

/// Runtime options for a [`SourceCache`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Project root. Relative patterns and watcher paths resolve against it.
    pub root: PathBuf,
    /// Long-running watch session: later fills only read changed paths.
    pub watch_mode: bool,
    /// Tolerance added to a task's last-run stamp before comparing mtimes.
    pub skew: Duration,
}

impl CacheOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            watch_mode: false,
            skew: DEFAULT_SKEW,
        }
    }

    pub fn watch_mode(mut self, val: bool) -> Self {
        self.watch_mode = val;
        self
    }

    pub fn skew(mut self, skew: Duration) -> Self {
        self.skew = skew;
        self
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FilesToTouchSection {
    #[serde(rename = "filesToTouch", default)]
    files_to_touch: Vec<PathBuf>,
}

pub struct SourceCache {
    options: CacheOptions,
    tree: PathTree,
    symlinks: SymlinkTable,
    matchers: SegmentMatchers,
    tasks: TaskTimes,
    deps: DependencyGraph,
    changed: BTreeSet<PathBuf>,
    files_to_touch: Vec<PathBuf>,
    has_touched_files: bool,
    last_fill: Option<Timestamp>,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn TaskReporter>,
}

impl fmt::Debug for SourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceCache")
            .field("options", &self.options)
            .field("files", &self.tree.file_count())
            .field("changed", &self.changed.len())
            .field("last_fill", &self.last_fill)
            .finish_non_exhaustive()
    }
}

impl SourceCache {
    pub fn new(
        options: CacheOptions,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        reporter: Arc<dyn TaskReporter>,
    ) -> Self {
        Self {
            options,
            tree: PathTree::new(),
            symlinks: SymlinkTable::new(),
            matchers: SegmentMatchers::new(),
            tasks: TaskTimes::new(),
            deps: DependencyGraph::new(),
            changed: BTreeSet::new(),
            files_to_touch: Vec::new(),
            has_touched_files: false,
            last_fill: None,
            fs,
            clock,
            reporter,
        }
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.deps
    }

    /// Paths reported by the watcher since the last non-incremental fill.
    pub fn changed_paths(&self) -> &BTreeSet<PathBuf> {
        &self.changed
    }

    pub fn files_to_touch(&self) -> &[PathBuf] {
        &self.files_to_touch
    }

    pub fn last_fill(&self) -> Option<Timestamp> {
        self.last_fill
    }

    /// Restore task stamps, the forced-rebuild list and the dependency graph.
    /// Missing sections leave the corresponding state empty.
    pub fn load_sections(&mut self, store: &dyn SectionStore) -> Result<()> {
        if let Some(value) = store.load(TASK_START_TIMES_SECTION)? {
            let committed: BTreeMap<TaskName, Timestamp> =
                decode(TASK_START_TIMES_SECTION, value)?;
            self.tasks = TaskTimes::from_committed(committed);
        }

        if let Some(value) = store.load(FILES_TO_TOUCH_SECTION)? {
            let section: FilesToTouchSection = decode(FILES_TO_TOUCH_SECTION, value)?;
            self.files_to_touch = section.files_to_touch;
        }

        if let Some(value) = store.load(FILE_DEPENDENCY_GRAPH_SECTION)? {
            let edges: BTreeMap<PathBuf, PathBuf> = decode(FILE_DEPENDENCY_GRAPH_SECTION, value)?;
            self.deps = DependencyGraph::from_edges(edges);
        }

        info!(
            tasks = self.tasks.committed().len(),
            files_to_touch = self.files_to_touch.len(),
            edges = self.deps.len(),
            "loaded cache sections"
        );
        Ok(())
    }

    /// Snapshot the persistent state into `store`.
    pub fn save_sections(&self, store: &mut dyn SectionStore) -> Result<()> {
        store.save(
            TASK_START_TIMES_SECTION,
            encode(TASK_START_TIMES_SECTION, self.tasks.committed())?,
        )?;
        store.save(
            FILES_TO_TOUCH_SECTION,
            encode(
                FILES_TO_TOUCH_SECTION,
                &FilesToTouchSection {
                    files_to_touch: self.files_to_touch.clone(),
                },
            )?,
        )?;
        store.save(
            FILE_DEPENDENCY_GRAPH_SECTION,
            encode(FILE_DEPENDENCY_GRAPH_SECTION, self.deps.edges())?,
        )?;
        Ok(())
    }

    /// Also cache every file under `real` at the same relative path under
    /// `alias`. Relative paths resolve against the project root.
    pub fn add_symlink(&mut self, real: impl AsRef<Path>, alias: impl AsRef<Path>) {
        let real = make_absolute(&self.options.root, real.as_ref());
        let alias = make_absolute(&self.options.root, alias.as_ref());
        debug!(?real, ?alias, "registered symlink alias");
        self.symlinks.add(real, alias);
    }

    /// Files currently cached that match `patterns`.
    pub fn matching_files<S: AsRef<str>>(
        &self,
        patterns: &[S],
        options: &SourceOptions,
    ) -> Vec<FileRecord> {
        collect_matches(
            &self.tree,
            &self.matchers,
            &self.options.root,
            patterns,
            options.base.as_deref(),
        )
    }

    /// The cached record at exactly `path`, without its payload. Relative
    /// paths resolve against the project root; glob syntax is not expanded.
    pub fn get_cached_file(&self, path: impl AsRef<Path>) -> Option<FileRecord> {
        let path = make_absolute(&self.options.root, path.as_ref());
        self.tree.lookup(&path).map(FileRecord::without_contents)
    }

    /// Insert into the tree, then clone into every symlink alias.
    fn insert_with_aliases(&mut self, file: FileRecord) -> InsertOutcome {
        let aliases = self.symlinks.aliases_for(&file.path);
        for alias in aliases {
            let mut clone = file.clone();
            clone.path = alias;
            self.tree.insert(clone);
        }
        self.tree.insert(file)
    }

    /// Remove `path` and every alias derived from it. Relative paths resolve
    /// against the project root.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        let path = make_absolute(&self.options.root, path.as_ref());
        for alias in self.symlinks.aliases_for(&path) {
            self.tree.remove(&alias);
        }
        if self.tree.remove(&path).is_some() {
            debug!(?path, "removed file from cache");
        }
    }
}
