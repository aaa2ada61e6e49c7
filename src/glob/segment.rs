// src/glob/segment.rs

use std::cell::RefCell;
use std::collections::HashMap;

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, error};

/// Compiled single-segment matchers, keyed by pattern text.
///
/// Entries are never evicted; the vocabulary is bounded by the globs the
/// project itself uses. Patterns that fail to compile are remembered as
/// never-matching so the error is logged once.
#[derive(Debug, Default)]
pub struct SegmentMatchers {
    compiled: RefCell<HashMap<String, Option<GlobMatcher>>>,
}

impl SegmentMatchers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_match(&self, pattern: &str, name: &str) -> bool {
        let mut compiled = self.compiled.borrow_mut();
        let matcher = compiled
            .entry(pattern.to_string())
            .or_insert_with(|| compile(pattern));
        matcher.as_ref().is_some_and(|m| m.is_match(name))
    }

    pub fn len(&self) -> usize {
        self.compiled.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.borrow().is_empty()
    }
}

fn compile(pattern: &str) -> Option<GlobMatcher> {
    match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => {
            debug!(pattern, "compiled glob segment");
            Some(glob.compile_matcher())
        }
        Err(err) => {
            error!(pattern, error = %err, "invalid glob segment; it will match nothing");
            None
        }
    }
}
