// src/watch/watcher.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watch::WatchEvent;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping it stops
/// watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and forward every relevant notification to `tx`.
///
/// Paths are reported under `root` as given, even when the OS reports them
/// under its canonical form.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    tx: mpsc::Sender<WatchEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let canonical = root.canonicalize().unwrap_or_else(|_| root.clone());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("srctree: failed to forward notify event: {err}");
                }
            }
            Err(err) => eprintln!("srctree: file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher.watch(&canonical, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", canonical);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            for change in translate(&event) {
                let change = rehome(change, &canonical, &root);
                if tx.send(change).await.is_err() {
                    warn!("watch event receiver dropped; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Map one `notify` event onto cache events. Access and unknown events map
/// to nothing.
pub fn translate(event: &Event) -> Vec<WatchEvent> {
    let paths = event.paths.iter().cloned();
    match &event.kind {
        EventKind::Create(_) => paths.map(WatchEvent::Added).collect(),
        EventKind::Remove(_) => paths.map(WatchEvent::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            paths.map(WatchEvent::Removed).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            paths.map(WatchEvent::Added).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
            [from, to] => vec![
                WatchEvent::Removed(from.clone()),
                WatchEvent::Added(to.clone()),
            ],
            _ => paths.map(WatchEvent::Changed).collect(),
        },
        EventKind::Modify(_) => paths.map(WatchEvent::Changed).collect(),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn rehome(event: WatchEvent, canonical: &Path, root: &Path) -> WatchEvent {
    let swap = |p: PathBuf| match p.strip_prefix(canonical) {
        Ok(rest) => root.join(rest),
        Err(_) => p,
    };
    match event {
        WatchEvent::Changed(p) => WatchEvent::Changed(swap(p)),
        WatchEvent::Added(p) => WatchEvent::Added(swap(p)),
        WatchEvent::Removed(p) => WatchEvent::Removed(swap(p)),
    }
}
