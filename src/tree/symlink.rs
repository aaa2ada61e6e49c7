// src/tree/symlink.rs

use std::path::{Path, PathBuf};

use crate::path_utils::strip_prefix_ignore_case;

/// Real-path prefix to alias prefixes.
///
/// A file cached under a real prefix is also cached under every alias, with
/// the prefix rewritten. Aliases fan out in registration order.
#[derive(Debug, Clone, Default)]
pub struct SymlinkTable {
    links: Vec<(PathBuf, Vec<PathBuf>)>,
}

impl SymlinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, real: impl Into<PathBuf>, alias: impl Into<PathBuf>) {
        let real = real.into();
        let alias = alias.into();
        match self.links.iter_mut().find(|(r, _)| *r == real) {
            Some((_, aliases)) => aliases.push(alias),
            None => self.links.push((real, vec![alias])),
        }
    }

    /// Every alias path `path` should also be cached under. Prefixes compare
    /// case-insensitively, like tree keys.
    pub fn aliases_for(&self, path: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for (real, aliases) in &self.links {
            if let Some(rest) = strip_prefix_ignore_case(path, real) {
                out.extend(aliases.iter().map(|alias| alias.join(&rest)));
            }
        }
        out
    }
}
