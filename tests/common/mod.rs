#![allow(dead_code)]

use std::error::Error;
use std::path::PathBuf;

use srctree::tree::FileRecord;

pub use srctree_test_utils::harness::{ROOT, T0};
pub use srctree_test_utils::{TestCache, init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Paths relative to the mock project root, forward slashes, sorted.
pub fn rel_paths<I>(files: I) -> Vec<String>
where
    I: IntoIterator<Item = FileRecord>,
{
    let mut out: Vec<String> = files
        .into_iter()
        .map(|f| rel(&f.path))
        .collect();
    out.sort();
    out
}

pub fn rel(path: &std::path::Path) -> String {
    path.strip_prefix(ROOT)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

pub fn abs(rel: &str) -> PathBuf {
    TestCache::path(rel)
}
