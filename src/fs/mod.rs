// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

use crate::types::Timestamp;

pub mod mock;

/// Metadata the cache needs about a path on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// True when the path (after following symlinks) is a directory.
    pub is_dir: bool,
    /// True when the path itself is a symbolic link.
    pub is_symlink: bool,
    pub mtime: Timestamp,
}

/// Abstract filesystem interface.
///
/// This is the I/O collaborator of the cache: fills read through it and
/// forced rebuilds touch through it.
pub trait FileSystem: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn metadata(&self, path: &Path) -> Result<FileMeta>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Move the modification time of an existing file to now.
    /// Never creates the file.
    fn touch(&self, path: &Path) -> Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn metadata(&self, path: &Path) -> Result<FileMeta> {
        let link = fs::symlink_metadata(path)
            .with_context(|| format!("reading metadata of {:?}", path))?;
        let meta = if link.file_type().is_symlink() {
            fs::metadata(path).with_context(|| format!("following symlink {:?}", path))?
        } else {
            link.clone()
        };
        let mtime = meta
            .modified()
            .with_context(|| format!("reading mtime of {:?}", path))?;

        Ok(FileMeta {
            is_dir: meta.is_dir(),
            is_symlink: link.file_type().is_symlink(),
            mtime: Timestamp::from_system_time(mtime),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }

    fn touch(&self, path: &Path) -> Result<()> {
        let file = fs::File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("opening {:?} to touch", path))?;
        file.set_modified(SystemTime::now())
            .with_context(|| format!("setting mtime of {:?}", path))?;
        Ok(())
    }
}
