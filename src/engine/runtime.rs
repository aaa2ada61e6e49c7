// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cache::SourceCache;
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::sections::SectionStore;

use super::core::SessionCore;
use super::{CoreCommand, RuntimeEvent, TaskReport, query_task};

/// Task name the fill reports under.
pub const FILL_TASK: &str = "fill";

/// Drives a [`SourceCache`] in response to `RuntimeEvent`s.
///
/// This is the IO shell around [`SessionCore`]: it reads events from the
/// channel, performs fills and queries, and persists sections.
pub struct Runtime {
    core: SessionCore,
    cache: SourceCache,
    config: ConfigFile,
    store: Box<dyn SectionStore>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        cache: SourceCache,
        config: ConfigFile,
        store: Box<dyn SectionStore>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            core: SessionCore::new(),
            cache,
            config,
            store,
            event_rx,
        }
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Apply the forced-rebuild list, fill, then run every task's query.
    ///
    /// Each task's run is committed straight away: the session only lists
    /// what a task would process. Sections are saved afterwards.
    pub async fn rebuild(&mut self) -> Result<Vec<TaskReport>> {
        self.cache.touch_all_files().await?;

        let root = self.cache.options().root.clone();
        let fill = self.config.cache().fill.clone();
        self.cache.fill_cache(FILL_TASK, &fill, &root, false).await?;

        let mut reports = Vec::new();
        for (name, task) in self.config.tasks() {
            if !self.cache.has_work(name, &task.src) {
                debug!(task = %name, "no work");
                continue;
            }
            let files: Vec<_> = query_task(&mut self.cache, name, task)
                .map(|f| f.path)
                .collect();
            self.cache.set_task_completed(name);
            if !files.is_empty() {
                reports.push(TaskReport {
                    task: name.clone(),
                    files,
                });
            }
        }

        self.cache.save_sections(self.store.as_mut())?;
        Ok(reports)
    }

    /// Main event loop. Returns the cache once the session ends.
    ///
    /// After each received event, everything already queued is drained and
    /// handled as one batch, so a burst of changes costs one rebuild.
    pub async fn run(mut self) -> Result<SourceCache> {
        info!("srctree session started");
        let reports = self.rebuild().await?;
        print_reports(&reports);

        loop {
            let Some(event) = self.event_rx.recv().await else {
                info!("runtime event channel closed; exiting");
                break;
            };

            let mut batch = vec![event];
            while let Ok(more) = self.event_rx.try_recv() {
                batch.push(more);
            }

            let outcome = self.handle_batch(batch).await?;
            print_reports(&outcome.reports);
            if !outcome.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        self.cache.save_sections(self.store.as_mut())?;
        info!("runtime exiting");
        Ok(self.cache)
    }

    /// Feed `batch` through the core, closing it with a batch end unless the
    /// session stops first.
    pub async fn handle_batch(&mut self, batch: Vec<RuntimeEvent>) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome {
            keep_running: true,
            reports: Vec::new(),
        };

        for event in batch.into_iter().chain(std::iter::once(RuntimeEvent::BatchEnd)) {
            debug!(?event, "runtime received event");
            let step = self.core.step(event);
            for command in step.commands {
                if let Some(reports) = self.execute_command(command).await? {
                    outcome.reports.extend(reports);
                }
            }
            if !step.keep_running {
                outcome.keep_running = false;
                break;
            }
        }
        Ok(outcome)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<Option<Vec<TaskReport>>> {
        match command {
            CoreCommand::ApplyWatch(change) => self.cache.handle_watch_event(change),
            CoreCommand::ApplyTask(event) => self.cache.handle_task_event(event),
            CoreCommand::Rebuild => return self.rebuild().await.map(Some),
            CoreCommand::RequestExit => info!("core issued RequestExit command"),
        }
        Ok(None)
    }
}

/// What handling one batch produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub keep_running: bool,
    pub reports: Vec<TaskReport>,
}

pub fn print_reports(reports: &[TaskReport]) {
    for report in reports {
        println!("[{}] {} file(s)", report.task, report.files.len());
        for path in &report.files {
            println!("  {}", path.display());
        }
    }
}
