// src/source.rs

//! Glob reads against the real filesystem.
//!
//! This is what a fill uses to pull files off disk: it expands patterns
//! through a [`FileSystem`], applies `!` exclusions and the `since` filter,
//! and reads each matching file's bytes.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, trace, warn};

use crate::errors::{Result, SrcTreeError};
use crate::fs::FileSystem;
use crate::path_utils::make_absolute;
use crate::tree::FileRecord;
use crate::types::{SourceOptions, Timestamp};

/// One path produced by a read. Directories are reported too; callers that
/// only want files skip them.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub base: PathBuf,
    pub is_dir: bool,
    pub mtime: Timestamp,
    pub contents: Option<Vec<u8>>,
}

impl SourceEntry {
    pub fn into_record(self) -> FileRecord {
        let record = FileRecord::new(self.path, self.base, self.mtime);
        match self.contents {
            Some(bytes) => record.with_contents(bytes),
            None => record,
        }
    }
}

pub fn has_glob_meta(text: &str) -> bool {
    text.contains(['*', '?', '[', '{'])
}

/// Expand `patterns` (absolute, or relative to `root`) and hand each entry
/// to `emit`. Returns how many entries were emitted.
///
/// `options.base` replaces each pattern's literal prefix as the entries'
/// base. `since`, `follow` and `allow_empty` apply as documented on
/// [`SourceOptions`]; `always_pass_through` means nothing to a disk read.
pub fn read_sources<S, F>(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[S],
    options: &SourceOptions,
    mut emit: F,
) -> Result<usize>
where
    S: AsRef<str>,
    F: FnMut(SourceEntry),
{
    let mut positives = Vec::new();
    let mut negatives = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        match pattern.strip_prefix('!') {
            Some(rest) => {
                negatives.add(build_glob(&absolute_text(root, rest))?);
            }
            None => positives.push(absolute_text(root, pattern)),
        }
    }
    let negatives = negatives.build().map_err(|source| SrcTreeError::Glob {
        pattern: "<exclusions>".to_string(),
        source,
    })?;

    let mut reader = Reader {
        fs,
        options,
        negatives,
        seen: BTreeSet::new(),
        emitted: 0,
    };

    for pattern in &positives {
        if has_glob_meta(pattern) {
            reader.read_glob(pattern, &mut emit)?;
        } else {
            reader.read_literal(Path::new(pattern), &mut emit)?;
        }
    }

    debug!(patterns = positives.len(), emitted = reader.emitted, "source read complete");
    Ok(reader.emitted)
}

fn absolute_text(root: &Path, pattern: &str) -> String {
    make_absolute(root, Path::new(pattern))
        .to_string_lossy()
        .replace('\\', "/")
}

fn build_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| SrcTreeError::Glob {
            pattern: pattern.to_string(),
            source,
        })
}

/// Directory holding every possible match: the components before the first
/// one containing glob syntax.
fn literal_prefix(pattern: &str) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in Path::new(pattern).components() {
        if let Component::Normal(part) = component {
            if has_glob_meta(&part.to_string_lossy()) {
                break;
            }
        }
        prefix.push(component.as_os_str());
    }
    prefix
}

struct Reader<'a> {
    fs: &'a dyn FileSystem,
    options: &'a SourceOptions,
    negatives: GlobSet,
    seen: BTreeSet<PathBuf>,
    emitted: usize,
}

impl Reader<'_> {
    fn read_literal<F: FnMut(SourceEntry)>(&mut self, path: &Path, emit: &mut F) -> Result<()> {
        if !self.fs.exists(path) {
            if self.options.allow_empty {
                trace!(?path, "literal source missing; skipped");
                return Ok(());
            }
            return Err(SrcTreeError::NotFound(path.to_path_buf()));
        }
        let base = match &self.options.base {
            Some(base) => base.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        self.offer(path.to_path_buf(), &base, emit)
    }

    fn read_glob<F: FnMut(SourceEntry)>(&mut self, pattern: &str, emit: &mut F) -> Result<()> {
        let matcher = build_glob(pattern)?.compile_matcher();
        let prefix = literal_prefix(pattern);
        let base = self.options.base.clone().unwrap_or_else(|| prefix.clone());

        if !self.fs.is_dir(&prefix) {
            trace!(?prefix, "glob prefix is not a directory; nothing to read");
            return Ok(());
        }

        let mut visited = BTreeSet::new();
        visited.insert(self.fs.canonicalize(&prefix).unwrap_or_else(|_| prefix.clone()));
        let mut stack = vec![prefix];
        while let Some(dir) = stack.pop() {
            let mut children = self.fs.read_dir(&dir)?;
            children.sort();
            for path in children {
                let text = path.to_string_lossy().replace('\\', "/");
                let is_match = matcher.is_match(&text) && !self.negatives.is_match(&text);
                let meta = match self.fs.metadata(&path) {
                    Ok(meta) => meta,
                    // Only a wanted entry that cannot be read fails the read.
                    Err(err) if is_match => return Err(err.into()),
                    Err(err) => {
                        warn!(?path, error = %err, "skipping unreadable entry");
                        continue;
                    }
                };
                if meta.is_dir && (self.options.follow || !meta.is_symlink) {
                    // A followed link back into an ancestor would loop forever.
                    let real = self.fs.canonicalize(&path).unwrap_or_else(|_| path.clone());
                    if visited.insert(real) {
                        stack.push(path.clone());
                    }
                }
                if is_match {
                    self.offer(path, &base, emit)?;
                }
            }
        }
        Ok(())
    }

    fn offer<F: FnMut(SourceEntry)>(&mut self, path: PathBuf, base: &Path, emit: &mut F) -> Result<()> {
        let text = path.to_string_lossy().replace('\\', "/");
        if self.negatives.is_match(&text) || self.seen.contains(&path) {
            return Ok(());
        }

        let meta = self.fs.metadata(&path)?;
        if let Some(since) = self.options.since {
            if meta.mtime <= since {
                return Ok(());
            }
        }

        let contents = if meta.is_dir {
            None
        } else {
            Some(self.fs.read(&path)?)
        };

        self.seen.insert(path.clone());
        self.emitted += 1;
        emit(SourceEntry {
            path,
            base: base.to_path_buf(),
            is_dir: meta.is_dir,
            mtime: meta.mtime,
            contents,
        });
        Ok(())
    }
}
