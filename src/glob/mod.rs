// src/glob/mod.rs

//! Glob lookups against the [`PathTree`](crate::tree::PathTree).
//!
//! - [`segment`] compiles and memoizes single-segment glob matchers.
//! - [`search`] walks the tree for a pattern list, including `!` negation.

pub mod search;
pub mod segment;

pub use search::collect_matches;
pub use segment::SegmentMatchers;

/// Whether `segment` should switch the walk into wildcard enumeration.
pub fn is_wildcard_segment(segment: &str) -> bool {
    segment == "**" || segment.contains('*')
}

/// The final segment of a pattern must name files: it needs a dot, or be a
/// bare `*` / `**`.
pub fn is_valid_final_segment(segment: &str) -> bool {
    segment.contains('.') || segment == "*" || segment == "**"
}
