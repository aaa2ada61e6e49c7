#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use srctree::config::{CacheSection, ConfigFile, RawConfigFile, SymlinkEntry, TaskConfig};
use srctree::errors::SrcTreeError;
use srctree::tree::FileRecord;
use srctree::types::Timestamp;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                cache: CacheSection::default(),
                symlink: Vec::new(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_symlink(mut self, real: &str, alias: &str) -> Self {
        self.config.symlink.push(SymlinkEntry {
            real: PathBuf::from(real),
            alias: PathBuf::from(alias),
        });
        self
    }

    pub fn with_root(mut self, root: &str) -> Self {
        self.config.cache.root = PathBuf::from(root);
        self
    }

    pub fn with_skew_ms(mut self, skew_ms: u64) -> Self {
        self.config.cache.skew_ms = skew_ms;
        self
    }

    pub fn with_fill(mut self, patterns: &[&str]) -> Self {
        self.config.cache.fill = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn watch_mode(mut self, val: bool) -> Self {
        self.config.cache.watch_mode = val;
        self
    }

    pub fn try_build(self) -> Result<ConfigFile, SrcTreeError> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(pattern: &str) -> Self {
        Self {
            task: TaskConfig {
                src: vec![pattern.to_string()],
                ..TaskConfig::default()
            },
        }
    }

    pub fn src(mut self, pattern: &str) -> Self {
        self.task.src.push(pattern.to_string());
        self
    }

    pub fn all_or_nothing(mut self) -> Self {
        self.task.all_or_nothing = true;
        self
    }

    pub fn always_pass_through(mut self) -> Self {
        self.task.always_pass_through = true;
        self
    }

    pub fn base(mut self, base: &str) -> Self {
        self.task.base = Some(PathBuf::from(base));
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

/// Builder for `FileRecord`.
pub struct RecordBuilder {
    record: FileRecord,
    contents: Option<Vec<u8>>,
}

impl RecordBuilder {
    pub fn new(path: &str) -> Self {
        let path = PathBuf::from(path);
        let base = path.parent().map(PathBuf::from).unwrap_or_default();
        Self {
            record: FileRecord::new(path, base, Timestamp::default()),
            contents: None,
        }
    }

    pub fn mtime(mut self, ms: u64) -> Self {
        self.record.mtime = Timestamp::from_millis(ms);
        self
    }

    pub fn base(mut self, base: &str) -> Self {
        self.record.base = PathBuf::from(base);
        self
    }

    pub fn contents(mut self, contents: &str) -> Self {
        self.contents = Some(contents.as_bytes().to_vec());
        self
    }

    /// The file as it looks after a generation step moved it to `path`.
    pub fn derived_to(mut self, path: &str) -> Self {
        self.record = self.record.derive(path);
        self
    }

    pub fn build(self) -> FileRecord {
        match self.contents {
            Some(bytes) => self.record.with_contents(bytes),
            None => self.record,
        }
    }
}
