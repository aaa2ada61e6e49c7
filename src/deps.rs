// src/deps.rs

//! Output-path to source-path edges, used to spot generated files whose
//! source has been deleted.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: BTreeMap<PathBuf, PathBuf>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: BTreeMap<PathBuf, PathBuf>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &BTreeMap<PathBuf, PathBuf> {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Remember that `output` was produced from `source`. A later edge for the
    /// same output replaces the earlier one.
    pub fn record_edge(&mut self, output: impl Into<PathBuf>, source: impl Into<PathBuf>) {
        let output = output.into();
        let source = source.into();
        debug!(?output, ?source, "recorded dependency edge");
        self.edges.insert(output, source);
    }

    pub fn source_of(&self, output: &Path) -> Option<&Path> {
        self.edges.get(output).map(PathBuf::as_path)
    }

    /// Follow edges from `output` until a path with no further source.
    ///
    /// A cycle stops at the first repeated path.
    pub fn root_of(&self, output: &Path) -> PathBuf {
        let mut current = output;
        let mut seen = BTreeSet::new();
        while let Some(next) = self.source_of(current) {
            if !seen.insert(current) {
                warn!(path = ?current, "dependency cycle; stopping at repeated path");
                break;
            }
            current = next;
        }
        current.to_path_buf()
    }
}
