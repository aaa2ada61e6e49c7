// src/lib.rs

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod deps;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod glob;
pub mod logging;
pub mod path_utils;
pub mod report;
pub mod sections;
pub mod source;
pub mod tree;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cache::{CacheOptions, SourceCache};
use crate::cli::{CliArgs, Command};
use crate::clock::SystemClock;
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::runtime::{FILL_TASK, print_reports};
use crate::engine::{Runtime, RuntimeEvent, TaskReport, query_task};
use crate::fs::RealFileSystem;
use crate::path_utils::make_absolute;
use crate::report::TracingReporter;
use crate::sections::{FileSectionStore, SectionStore};
use crate::types::SourceOptions;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, restores the cache's sections, registers symlink
/// aliases, then runs the requested subcommand.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let config_dir = config_root_dir(&config_path);

    let options = cfg.cache_options(&config_dir);
    let mut store = FileSectionStore::new(cfg.cache().resolved_state_file(&config_dir));
    let mut cache = build_cache(&cfg, options, &store)?;

    match args.command {
        Command::Ls { patterns } => {
            fill(&mut cache, &cfg).await?;
            for file in cache.matching_files(&patterns, &SourceOptions::default()) {
                println!("{}", file.path.display());
            }
        }
        Command::Changed { task } => {
            let task_cfg = cfg
                .task(&task)
                .ok_or_else(|| anyhow::anyhow!("unknown task '{task}'"))?;
            fill(&mut cache, &cfg).await?;
            let files: Vec<_> = query_task(&mut cache, &task, task_cfg)
                .map(|f| f.path)
                .collect();
            print_reports(&[TaskReport {
                task: task.clone(),
                files,
            }]);
            cache.set_task_completed(&task);
            cache.save_sections(&mut store)?;
        }
        Command::Deleted { patterns } => {
            fill(&mut cache, &cfg).await?;
            for file in cache.get_deleted_files(&patterns) {
                println!("{}", file.path.display());
            }
        }
        Command::Touch { paths } => {
            for path in paths {
                cache.reprocess_file_on_next_build(path);
            }
            cache.save_sections(&mut store)?;
            info!(queued = cache.files_to_touch().len(), "files queued for next build");
        }
        Command::Watch => watch(cache, cfg, store).await?,
    }

    Ok(())
}

/// A cache over the real filesystem with sections restored and aliases
/// registered.
pub fn build_cache(
    cfg: &ConfigFile,
    options: CacheOptions,
    store: &dyn SectionStore,
) -> crate::errors::Result<SourceCache> {
    let mut cache = SourceCache::new(
        options,
        Arc::new(RealFileSystem),
        Arc::new(SystemClock),
        Arc::new(TracingReporter),
    );
    cache.load_sections(store)?;
    for link in cfg.symlinks() {
        cache.add_symlink(&link.real, &link.alias);
    }
    debug!(?cache, "cache ready");
    Ok(cache)
}

async fn fill(cache: &mut SourceCache, cfg: &ConfigFile) -> Result<()> {
    cache.touch_all_files().await?;
    let root = cache.options().root.clone();
    cache
        .fill_cache(FILL_TASK, &cfg.cache().fill, &root, false)
        .await?;
    Ok(())
}

async fn watch(cache: SourceCache, cfg: ConfigFile, store: FileSectionStore) -> Result<()> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(256);

    let (watch_tx, mut watch_rx) = mpsc::channel(256);
    let _watcher = crate::watch::spawn_watcher(cache.options().root.clone(), watch_tx)?;
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            while let Some(change) = watch_rx.recv().await {
                if tx.send(RuntimeEvent::Watch(change)).await.is_err() {
                    break;
                }
            }
        });
    }

    // Ctrl-C -> graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let runtime = Runtime::new(cache, cfg, Box::new(store), rt_rx);
    runtime.run().await?;
    Ok(())
}

/// Absolute directory that relative config paths resolve against: the
/// config file's parent, or the current directory for a bare filename.
fn config_root_dir(config_path: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => make_absolute(&cwd, parent),
        _ => cwd,
    }
}
