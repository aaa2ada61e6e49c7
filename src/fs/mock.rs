// src/fs/mock.rs

use super::{FileMeta, FileSystem};
use crate::clock::{Clock, SystemClock};
use crate::types::Timestamp;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { contents: Vec<u8>, mtime: Timestamp },
    Dir(Vec<String>), // List of child names
    /// Symlink to a directory elsewhere in the mock tree.
    Link(PathBuf),
}

#[derive(Debug, Clone)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    failing_touches: Arc<Mutex<HashSet<PathBuf>>>,
    clock: Arc<dyn Clock>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Mock whose `touch` and default mtimes come from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            failing_touches: Arc::new(Mutex::new(HashSet::new())),
            clock,
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mtime = self.clock.now();
        self.add_file_with_mtime(path, content, mtime);
    }

    pub fn add_file_with_mtime(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        mtime: Timestamp,
    ) {
        let path = path.as_ref().to_path_buf();
        let mut files = lock(&self.files);
        files.insert(
            path.clone(),
            MockEntry::File {
                contents: content.into(),
                mtime,
            },
        );
        Self::link_into_parent(&mut files, &path);
    }

    /// Register `link` as a symlink to the directory `target`.
    pub fn add_dir_link(&self, link: impl AsRef<Path>, target: impl AsRef<Path>) {
        let link = link.as_ref().to_path_buf();
        let mut files = lock(&self.files);
        files.insert(link.clone(), MockEntry::Link(target.as_ref().to_path_buf()));
        Self::link_into_parent(&mut files, &link);
    }

    pub fn set_mtime(&self, path: impl AsRef<Path>, mtime: Timestamp) {
        let mut files = lock(&self.files);
        if let Some(MockEntry::File { mtime: current, .. }) = files.get_mut(path.as_ref()) {
            *current = mtime;
        }
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut files = lock(&self.files);
        files.remove(path);
        if let Some(MockEntry::Dir(children)) = path.parent().and_then(|p| files.get_mut(p)) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                children.retain(|c| c != name);
            }
        }
    }

    /// Make every subsequent `touch` of `path` fail.
    pub fn fail_touch(&self, path: impl AsRef<Path>) {
        lock(&self.failing_touches).insert(path.as_ref().to_path_buf());
    }

    fn link_into_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        // Ensure parent directories exist implicitly for simplicity in this mock
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };

            Self::ensure_dir_entry(files, parent);
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if !children.iter().any(|c| c == name) {
                        children.push(name.to_string());
                    }
                }
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };

            if parent != path {
                Self::ensure_dir_entry(files, parent);
                if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        if !children.iter().any(|c| c == name) {
                            children.push(name.to_string());
                        }
                    }
                }
            }
        }
    }

    /// Follow links on the path itself or on any of its ancestors; gives up
    /// after a few hops.
    fn resolve(files: &HashMap<PathBuf, MockEntry>, path: &Path) -> Option<(PathBuf, MockEntry)> {
        let mut current = path.to_path_buf();
        'hops: for _ in 0..8 {
            match files.get(&current) {
                Some(MockEntry::Link(target)) => {
                    current = target.clone();
                    continue;
                }
                Some(entry) => return Some((current, entry.clone())),
                None => {}
            }
            for ancestor in current.ancestors().skip(1) {
                if let Some(MockEntry::Link(target)) = files.get(ancestor) {
                    let rest = current.strip_prefix(ancestor).ok()?.to_path_buf();
                    current = target.join(rest);
                    continue 'hops;
                }
            }
            return None;
        }
        None
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let files = lock(&self.files);
        match Self::resolve(&files, path) {
            Some((_, MockEntry::File { contents, .. })) => Ok(contents),
            Some(_) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn metadata(&self, path: &Path) -> Result<FileMeta> {
        let files = lock(&self.files);
        let is_symlink = matches!(files.get(path), Some(MockEntry::Link(_)));
        match Self::resolve(&files, path) {
            Some((_, MockEntry::File { mtime, .. })) => Ok(FileMeta {
                is_dir: false,
                is_symlink,
                mtime,
            }),
            Some(_) => Ok(FileMeta {
                is_dir: true,
                is_symlink,
                mtime: Timestamp::default(),
            }),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let files = lock(&self.files);
        Self::resolve(&files, path).is_some()
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = lock(&self.files);
        matches!(Self::resolve(&files, path), Some((_, MockEntry::File { .. })))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = lock(&self.files);
        matches!(Self::resolve(&files, path), Some((_, MockEntry::Dir(_))))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        let files = lock(&self.files);
        Self::resolve(&files, path)
            .map(|(p, _)| p)
            .ok_or_else(|| anyhow!("File not found: {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let files = lock(&self.files);
        match Self::resolve(&files, path) {
            // Children are reported under the requested path, not the link target.
            Some((_, MockEntry::Dir(children))) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn touch(&self, path: &Path) -> Result<()> {
        if lock(&self.failing_touches).contains(path) {
            return Err(anyhow!("touch refused: {:?}", path));
        }
        let now = self.clock.now();
        let mut files = lock(&self.files);
        let real = Self::resolve(&files, path)
            .map(|(p, _)| p)
            .unwrap_or_else(|| path.to_path_buf());
        match files.get_mut(&real) {
            Some(MockEntry::File { mtime, .. }) => {
                *mtime = now;
                Ok(())
            }
            _ => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}
