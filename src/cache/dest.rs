// src/cache/dest.rs

//! The pass-through stage placed after a generation step.

use std::path::{Path, PathBuf};

use crate::cache::SourceCache;
use crate::path_utils::make_absolute;
use crate::tree::FileRecord;
use crate::types::SourceOptions;

impl SourceCache {
    /// Cache every generated file as it passes and yield it unchanged.
    ///
    /// The returned iterator is lazy; the cache is only updated for the files
    /// actually pulled through it.
    pub fn cache_dest<'a, I>(
        &'a mut self,
        files: I,
        root_extensions: Option<&'a [String]>,
    ) -> impl Iterator<Item = FileRecord> + 'a
    where
        I: IntoIterator<Item = FileRecord>,
        I::IntoIter: 'a,
    {
        files.into_iter().map(move |file| {
            self.cache_dest_file(&file, root_extensions);
            file
        })
    }

    /// Record `file`'s dependency edge and cache a content-less copy of it.
    ///
    /// The cached copy gets a fresh mtime when nothing was cached at its path
    /// before or when its payload differs from what was.
    pub fn cache_dest_file(&mut self, file: &FileRecord, root_extensions: Option<&[String]>) {
        let root = self.options.root.clone();
        let output = make_absolute(&root, &file.path);

        if file.history.len() > 1 {
            let origin = make_absolute(&root, file.origin());
            match root_extensions {
                Some(extensions) => {
                    if let Some(source) = self.resolve_root_extension(&origin, extensions) {
                        self.deps.record_edge(output.clone(), source);
                    }
                }
                None => self.deps.record_edge(output.clone(), origin),
            }
        }

        let mut copy = file.without_contents();
        copy.path = output.clone();
        let outcome = self.insert_with_aliases(copy);
        let refresh = match &outcome.previous {
            None => true,
            Some(previous) => !previous.same_contents(file),
        };
        if refresh {
            let now = self.clock.now();
            if let Some(cached) = self.tree.lookup_mut(&output) {
                cached.mtime = now;
            }
        }
    }

    /// First extension swap of `origin` that names exactly one cached file.
    fn resolve_root_extension(&self, origin: &Path, extensions: &[String]) -> Option<PathBuf> {
        extensions.iter().find_map(|ext| {
            let candidate = origin.with_extension(ext.trim_start_matches('.'));
            let pattern = candidate.to_string_lossy().into_owned();
            let hits = self.matching_files(&[pattern], &SourceOptions::default());
            (hits.len() == 1).then_some(candidate)
        })
    }
}
