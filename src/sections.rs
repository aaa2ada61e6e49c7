// src/sections.rs

//! Named, opaque persistence sections.
//!
//! The cache snapshots three sections (task stamps, the forced-rebuild list
//! and the dependency graph) through a [`SectionStore`]. Values are
//! `toml::Value`s so the store never needs to know their shape.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::{Result, SrcTreeError};

pub const TASK_START_TIMES_SECTION: &str = "fastSrc-taskStartTimes";
pub const FILES_TO_TOUCH_SECTION: &str = "fastSrc-filesToTouch";
pub const FILE_DEPENDENCY_GRAPH_SECTION: &str = "fastSrc-fileDependencyGraph";

/// Abstract storage for sections.
pub trait SectionStore: Send + Sync + Debug {
    fn load(&self, name: &str) -> Result<Option<toml::Value>>;
    fn save(&mut self, name: &str, value: toml::Value) -> Result<()>;
}

pub fn encode<T: Serialize>(name: &str, value: &T) -> Result<toml::Value> {
    toml::Value::try_from(value).map_err(|e| SrcTreeError::Section {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

pub fn decode<T: DeserializeOwned>(name: &str, value: toml::Value) -> Result<T> {
    value.try_into().map_err(|e: toml::de::Error| SrcTreeError::Section {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Stores sections in memory only.
#[derive(Debug, Default)]
pub struct MemorySectionStore {
    sections: HashMap<String, toml::Value>,
}

impl MemorySectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SectionStore for MemorySectionStore {
    fn load(&self, name: &str) -> Result<Option<toml::Value>> {
        Ok(self.sections.get(name).cloned())
    }

    fn save(&mut self, name: &str, value: toml::Value) -> Result<()> {
        self.sections.insert(name.to_string(), value);
        Ok(())
    }
}

/// Stores all sections in a single TOML document on disk.
#[derive(Debug, Clone)]
pub struct FileSectionStore {
    path: PathBuf,
}

impl FileSectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_all(&self) -> Result<toml::Table> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading section file at {:?}", self.path))?;
        Ok(toml::from_str(&text)?)
    }

    fn save_all(&self, table: &toml::Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating section directory at {:?}", parent))?;
        }
        let text = toml::to_string(table).map_err(|e| SrcTreeError::Section {
            name: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, text)
            .with_context(|| format!("writing section file at {:?}", self.path))?;
        Ok(())
    }
}

impl SectionStore for FileSectionStore {
    fn load(&self, name: &str) -> Result<Option<toml::Value>> {
        let mut table = self.load_all()?;
        debug!(section = name, file = ?self.path, "loading section");
        Ok(table.remove(name))
    }

    fn save(&mut self, name: &str, value: toml::Value) -> Result<()> {
        let mut table = self.load_all()?;
        table.insert(name.to_string(), value);
        self.save_all(&table)?;
        info!(section = name, file = ?self.path, "stored section");
        Ok(())
    }
}
