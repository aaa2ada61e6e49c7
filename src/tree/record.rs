// src/tree/record.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::types::Timestamp;

/// Metadata for one cached source (or generated) file.
///
/// `path` keeps its original casing; the tree lowercases only its keys.
/// `history` lists every path the file has had, origin first and current
/// path last, so a generation step can be traced back to its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub base: PathBuf,
    pub mtime: Timestamp,
    pub history: Vec<PathBuf>,
    contents: Option<Arc<[u8]>>,
    digest: Option<blake3::Hash>,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, base: impl Into<PathBuf>, mtime: Timestamp) -> Self {
        let path = path.into();
        Self {
            history: vec![path.clone()],
            path,
            base: base.into(),
            mtime,
            contents: None,
            digest: None,
        }
    }

    /// Attach a payload. The digest is kept even after the payload is dropped
    /// so content-less clones can still be compared.
    pub fn with_contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = contents.into();
        self.digest = Some(blake3::hash(&bytes));
        self.contents = Some(Arc::from(bytes));
        self
    }

    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    pub fn digest(&self) -> Option<&blake3::Hash> {
        self.digest.as_ref()
    }

    /// Detached copy without the payload.
    pub fn without_contents(&self) -> Self {
        Self {
            path: self.path.clone(),
            base: self.base.clone(),
            mtime: self.mtime,
            history: self.history.clone(),
            contents: None,
            digest: self.digest,
        }
    }

    pub fn rebased(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = base.into();
        self
    }

    /// Record a transformation that moved this file to `new_path`.
    pub fn derive(mut self, new_path: impl Into<PathBuf>) -> Self {
        let new_path = new_path.into();
        self.history.push(new_path.clone());
        self.path = new_path;
        self
    }

    /// Path of the file before any transformation.
    pub fn origin(&self) -> &Path {
        self.history.first().map(PathBuf::as_path).unwrap_or(&self.path)
    }

    /// True when both records carry the same payload digest (or neither has one).
    pub fn same_contents(&self, other: &FileRecord) -> bool {
        self.digest == other.digest
    }
}
