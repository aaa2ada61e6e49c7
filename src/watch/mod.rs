// src/watch/mod.rs

//! Filesystem change notifications.
//!
//! The cache does not watch anything itself. A watcher (the `notify` adapter
//! in [`watcher`], or any host-side source) reports [`WatchEvent`]s, and
//! [`SourceCache::handle_watch_event`](crate::cache::SourceCache::handle_watch_event)
//! folds them into the changed-path set or removes files from the tree.

use std::path::PathBuf;

pub mod watcher;

pub use watcher::{WatcherHandle, spawn_watcher, translate};

/// One raw path notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchEvent {
    Changed(PathBuf),
    Added(PathBuf),
    Removed(PathBuf),
}

impl WatchEvent {
    pub fn path(&self) -> &PathBuf {
        match self {
            WatchEvent::Changed(p) | WatchEvent::Added(p) | WatchEvent::Removed(p) => p,
        }
    }
}
