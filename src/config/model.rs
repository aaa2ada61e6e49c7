// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheOptions;
use crate::path_utils::make_absolute;
use crate::types::{DEFAULT_SKEW, SourceOptions};

/// Configuration exactly as deserialized, before validation.
///
/// ```toml
/// [cache]
/// root = "."
/// watch_mode = false
/// skew_ms = 50
/// state_file = ".srctree/sections.toml"
///
/// [[symlink]]
/// real = "node_modules/widgets"
/// alias = "../widgets"
///
/// [task.styles]
/// src = ["src/**/*.less", "!src/vendor/*.less"]
/// base = "src"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub cache: CacheSection,

    #[serde(default)]
    pub symlink: Vec<SymlinkEntry>,

    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    cache: CacheSection,
    symlinks: Vec<SymlinkEntry>,
    tasks: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        cache: CacheSection,
        symlinks: Vec<SymlinkEntry>,
        tasks: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            cache,
            symlinks,
            tasks,
        }
    }

    pub fn cache(&self) -> &CacheSection {
        &self.cache
    }

    pub fn symlinks(&self) -> &[SymlinkEntry] {
        &self.symlinks
    }

    pub fn tasks(&self) -> &BTreeMap<String, TaskConfig> {
        &self.tasks
    }

    pub fn task(&self, name: &str) -> Option<&TaskConfig> {
        self.tasks.get(name)
    }

    /// Runtime options, with `root` resolved against `config_dir`.
    pub fn cache_options(&self, config_dir: &Path) -> CacheOptions {
        CacheOptions::new(self.cache.resolved_root(config_dir))
            .watch_mode(self.cache.watch_mode)
            .skew(self.cache.skew())
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default)]
    pub watch_mode: bool,

    #[serde(default = "default_skew_ms")]
    pub skew_ms: u64,

    /// Where the section store lives, relative to `root`.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Patterns read by every fill.
    #[serde(default = "default_fill")]
    pub fill: Vec<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_skew_ms() -> u64 {
    DEFAULT_SKEW.as_millis() as u64
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".srctree/sections.toml")
}

fn default_fill() -> Vec<String> {
    vec!["**/*".to_string()]
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            watch_mode: false,
            skew_ms: default_skew_ms(),
            state_file: default_state_file(),
            fill: default_fill(),
        }
    }
}

impl CacheSection {
    pub fn skew(&self) -> Duration {
        Duration::from_millis(self.skew_ms)
    }

    pub fn resolved_root(&self, config_dir: &Path) -> PathBuf {
        make_absolute(config_dir, &self.root)
    }

    pub fn resolved_state_file(&self, config_dir: &Path) -> PathBuf {
        make_absolute(&self.resolved_root(config_dir), &self.state_file)
    }
}

/// `[[symlink]]` entry: files under `real` are also cached under `alias`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SymlinkEntry {
    pub real: PathBuf,
    pub alias: PathBuf,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    /// Source patterns; `!` entries exclude.
    pub src: Vec<String>,

    /// Emit every source when any changed, instead of only the changed ones.
    #[serde(default)]
    pub all_or_nothing: bool,

    #[serde(default)]
    pub always_pass_through: bool,

    #[serde(default)]
    pub base: Option<PathBuf>,
}

impl TaskConfig {
    pub fn source_options(&self) -> SourceOptions {
        let options = SourceOptions::default().always_pass_through(self.always_pass_through);
        match &self.base {
            Some(base) => options.with_base(base.clone()),
            None => options,
        }
    }

    pub fn positive_patterns(&self) -> impl Iterator<Item = &str> {
        self.src
            .iter()
            .map(String::as_str)
            .filter(|p| !p.starts_with('!'))
    }
}
