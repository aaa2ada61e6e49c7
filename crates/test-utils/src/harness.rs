use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use srctree::cache::{CacheOptions, SourceCache};
use srctree::clock::ManualClock;
use srctree::fs::mock::MockFileSystem;
use srctree::types::Timestamp;

use crate::reporter::RecordingReporter;

/// Project root used by every mock-backed cache.
pub const ROOT: &str = "/proj";

/// Start of the manual clock.
pub const T0: Timestamp = Timestamp::from_millis(1_000_000);

/// A [`SourceCache`] over an in-memory filesystem with a manual clock.
///
/// The filesystem, clock and reporter handles are shared with the cache, so
/// tests can mutate files and time underneath it.
#[derive(Debug)]
pub struct TestCache {
    pub cache: SourceCache,
    pub fs: MockFileSystem,
    pub clock: ManualClock,
    pub reporter: RecordingReporter,
}

impl TestCache {
    pub fn new() -> Self {
        Self::with_options(CacheOptions::new(ROOT))
    }

    pub fn watch_mode() -> Self {
        Self::with_options(CacheOptions::new(ROOT).watch_mode(true))
    }

    pub fn with_options(options: CacheOptions) -> Self {
        let clock = ManualClock::new(T0);
        let fs = MockFileSystem::with_clock(Arc::new(clock.clone()));
        let reporter = RecordingReporter::new();
        let cache = SourceCache::new(
            options,
            Arc::new(fs.clone()),
            Arc::new(clock.clone()),
            Arc::new(reporter.clone()),
        );
        Self {
            cache,
            fs,
            clock,
            reporter,
        }
    }

    /// Absolute path under the project root.
    pub fn path(rel: &str) -> PathBuf {
        Path::new(ROOT).join(rel)
    }

    /// Write a file under the root, stamped with the current clock.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = Self::path(rel);
        self.fs.add_file(&path, contents);
        path
    }

    pub fn advance(&self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
    }

    /// Fill everything under the root.
    pub async fn fill_all(&mut self) -> Vec<PathBuf> {
        self.cache
            .fill_cache("fill", &["**/*"], ROOT, false)
            .await
            .expect("fill failed")
            .map(|f| f.path)
            .collect()
    }
}

impl Default for TestCache {
    fn default() -> Self {
        Self::new()
    }
}
