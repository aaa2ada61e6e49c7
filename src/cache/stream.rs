// src/cache/stream.rs

use crate::tree::FileRecord;

/// Finite, single-pass sequence of file records produced by one scan.
///
/// Consuming it cannot be repeated; asking the cache again performs a fresh
/// scan.
#[derive(Debug, Default)]
pub struct FileStream {
    files: std::vec::IntoIter<FileRecord>,
}

impl FileStream {
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self {
            files: files.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl Iterator for FileStream {
    type Item = FileRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.files.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

impl ExactSizeIterator for FileStream {}
