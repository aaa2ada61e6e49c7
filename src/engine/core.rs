// src/engine/core.rs

//! Pure session state machine.
//!
//! Consumes [`RuntimeEvent`]s and returns the commands the shell should
//! execute. Watch events are applied one by one; a rebuild is requested once
//! per batch, and only if the batch contained a watch event.
//!
//! No channels, no Tokio types, no IO.

use tracing::debug;

use crate::engine::{CoreCommand, CoreStep, RuntimeEvent};

#[derive(Debug, Default)]
pub struct SessionCore {
    pending_changes: usize,
    rebuilds: u64,
}

impl SessionCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch events seen since the last rebuild request.
    pub fn pending_changes(&self) -> usize {
        self.pending_changes
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let commands = match event {
            RuntimeEvent::Watch(change) => {
                self.pending_changes += 1;
                vec![CoreCommand::ApplyWatch(change)]
            }
            RuntimeEvent::Task(task) => vec![CoreCommand::ApplyTask(task)],
            RuntimeEvent::BatchEnd if self.pending_changes > 0 => {
                debug!(changes = self.pending_changes, "batch complete; rebuilding");
                self.pending_changes = 0;
                self.rebuilds += 1;
                vec![CoreCommand::Rebuild]
            }
            RuntimeEvent::BatchEnd => Vec::new(),
            RuntimeEvent::ShutdownRequested => {
                return CoreStep {
                    commands: vec![CoreCommand::RequestExit],
                    keep_running: false,
                };
            }
        };

        CoreStep {
            commands,
            keep_running: true,
        }
    }
}
