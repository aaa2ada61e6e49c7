// src/tree/mod.rs

//! In-memory trie of cached files.
//!
//! Keys are the lowercase, forward-slash segments of a file's absolute path.
//! Leaves hold [`FileRecord`]s, inner nodes are directories. A path is either
//! a directory or a file: inserting one where the other lives replaces it.

use std::collections::BTreeMap;
use std::path::Path;

use crate::path_utils::key_segments;

pub mod record;
pub mod symlink;

pub use record::FileRecord;
pub use symlink::SymlinkTable;

#[derive(Debug, Clone)]
pub enum Node {
    Dir(Directory),
    File(FileRecord),
}

#[derive(Debug, Clone, Default)]
pub struct Directory {
    children: BTreeMap<String, Node>,
}

impl Directory {
    pub fn child(&self, segment: &str) -> Option<&Node> {
        self.children.get(segment)
    }

    /// Children in key order.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn file_count(&self) -> usize {
        self.children
            .values()
            .map(|node| match node {
                Node::Dir(dir) => dir.file_count(),
                Node::File(_) => 1,
            })
            .sum()
    }
}

/// What an insertion displaced.
#[derive(Debug, Clone)]
pub struct InsertOutcome {
    /// The file previously cached at the same path, if any.
    pub previous: Option<FileRecord>,
}

impl InsertOutcome {
    pub fn is_new(&self) -> bool {
        self.previous.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PathTree {
    root: Directory,
}

impl PathTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Directory {
        &self.root
    }

    pub fn file_count(&self) -> usize {
        self.root.file_count()
    }

    /// Cache `file` at its path, creating directories on the way.
    ///
    /// Files found where a directory is needed are replaced by that
    /// directory. A directory found at the final segment is replaced by the
    /// file and does not count as a previous occupant.
    pub fn insert(&mut self, file: FileRecord) -> InsertOutcome {
        let segments = key_segments(&file.path);
        let Some((last, parents)) = segments.split_last() else {
            return InsertOutcome { previous: None };
        };

        let mut dir = &mut self.root;
        for segment in parents {
            let slot = dir
                .children
                .entry(segment.clone())
                .or_insert_with(|| Node::Dir(Directory::default()));
            if let Node::File(_) = slot {
                *slot = Node::Dir(Directory::default());
            }
            dir = match slot {
                Node::Dir(next) => next,
                Node::File(_) => return InsertOutcome { previous: None },
            };
        }

        let previous = match dir.children.insert(last.clone(), Node::File(file)) {
            Some(Node::File(prev)) => Some(prev),
            _ => None,
        };
        InsertOutcome { previous }
    }

    /// Drop whatever is cached at `path`. Missing intermediate directories
    /// make this a no-op. Returns the removed file, if it was one.
    pub fn remove(&mut self, path: &Path) -> Option<FileRecord> {
        let segments = key_segments(path);
        let (last, parents) = segments.split_last()?;

        let mut dir = &mut self.root;
        for segment in parents {
            match dir.children.get_mut(segment) {
                Some(Node::Dir(next)) => dir = next,
                _ => return None,
            }
        }

        match dir.children.remove(last) {
            Some(Node::File(file)) => Some(file),
            _ => None,
        }
    }

    /// Exact lookup. Directories are never returned.
    pub fn lookup(&self, path: &Path) -> Option<&FileRecord> {
        let segments = key_segments(path);
        let (last, parents) = segments.split_last()?;

        let mut dir = &self.root;
        for segment in parents {
            match dir.children.get(segment) {
                Some(Node::Dir(next)) => dir = next,
                _ => return None,
            }
        }

        match dir.children.get(last) {
            Some(Node::File(file)) => Some(file),
            _ => None,
        }
    }

    pub fn lookup_mut(&mut self, path: &Path) -> Option<&mut FileRecord> {
        let segments = key_segments(path);
        let (last, parents) = segments.split_last()?;

        let mut dir = &mut self.root;
        for segment in parents {
            match dir.children.get_mut(segment) {
                Some(Node::Dir(next)) => dir = next,
                _ => return None,
            }
        }

        match dir.children.get_mut(last) {
            Some(Node::File(file)) => Some(file),
            _ => None,
        }
    }
}
