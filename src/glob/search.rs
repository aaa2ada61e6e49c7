// src/glob/search.rs

use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use tracing::error;

use crate::glob::{SegmentMatchers, is_valid_final_segment, is_wildcard_segment};
use crate::path_utils::{make_absolute, to_native};
use crate::tree::{Directory, FileRecord, Node, PathTree};

/// Resolve `patterns` against the tree.
///
/// Relative patterns are taken relative to `root`. Patterns starting with `!`
/// collect files to drop: each negated hit removes the first positive result
/// with the same path. Every result is a detached, content-less copy whose
/// base is `base` when given, else the pattern's literal prefix.
pub fn collect_matches<S: AsRef<str>>(
    tree: &PathTree,
    matchers: &SegmentMatchers,
    root: &Path,
    patterns: &[S],
    base: Option<&Path>,
) -> Vec<FileRecord> {
    let base = base.map(|b| make_absolute(root, b));
    let mut results = Vec::new();
    let mut negated = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        match pattern.strip_prefix('!') {
            Some(rest) => search(tree, matchers, root, rest, base.as_deref(), &mut negated),
            None => search(tree, matchers, root, pattern, base.as_deref(), &mut results),
        }
    }

    for gone in &negated {
        if let Some(pos) = results.iter().position(|r: &FileRecord| r.path == gone.path) {
            results.remove(pos);
        }
    }

    results
}

fn search(
    tree: &PathTree,
    matchers: &SegmentMatchers,
    root: &Path,
    pattern: &str,
    base: Option<&Path>,
    out: &mut Vec<FileRecord>,
) {
    let absolute = make_absolute(root, Path::new(pattern));
    let text = absolute.to_string_lossy().replace('\\', "/");
    let original: Vec<&str> = text.split('/').collect();
    let lower: Vec<String> = original.iter().map(|s| s.to_lowercase()).collect();

    let last = lower.len() - 1;
    let final_segment = lower[last].as_str();
    if !is_valid_final_segment(final_segment) {
        error!(pattern = %text, "glob needs a dot in the last segment of the path; nothing matched");
        return;
    }

    let mut dir = tree.root();
    for (i, segment) in lower.iter().enumerate() {
        if is_wildcard_segment(segment) {
            let walk = Walk {
                matchers,
                final_segment,
                base: resolve_base(base, &original[..i]),
            };
            walk.collect(dir, segment == "**", false, out);
            return;
        }

        match dir.child(segment) {
            Some(Node::Dir(next)) if i < last => dir = next,
            Some(Node::File(file)) if i == last => {
                let base = resolve_base(base, &original[..i]);
                out.push(file.without_contents().rebased(base));
                return;
            }
            _ => return,
        }
    }
}

fn resolve_base(explicit: Option<&Path>, prefix: &[&str]) -> PathBuf {
    if let Some(base) = explicit {
        return base.to_path_buf();
    }
    let joined = prefix.join("/");
    if joined.is_empty() {
        PathBuf::from(MAIN_SEPARATOR_STR)
    } else {
        to_native(Path::new(&joined))
    }
}

struct Walk<'a> {
    matchers: &'a SegmentMatchers,
    final_segment: &'a str,
    base: PathBuf,
}

impl Walk<'_> {
    /// `traverse` descends into every directory; `take_all` skips name tests.
    /// A directory whose name matches switches to both for its subtree.
    fn collect(&self, dir: &Directory, traverse: bool, take_all: bool, out: &mut Vec<FileRecord>) {
        for (name, node) in dir.children() {
            match node {
                Node::Dir(sub) if traverse => self.collect(sub, traverse, take_all, out),
                _ if take_all || self.matchers.is_match(self.final_segment, name) => match node {
                    Node::Dir(sub) => self.collect(sub, true, true, out),
                    Node::File(file) => out.push(file.without_contents().rebased(self.base.clone())),
                },
                _ => {}
            }
        }
    }
}
