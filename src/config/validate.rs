// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SrcTreeError};

/// Longest skew window accepted, in milliseconds.
pub const MAX_SKEW_MS: u64 = 60_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SrcTreeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.cache, raw.symlink, raw.task))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_cache_section(cfg)?;
    validate_symlinks(cfg)?;
    validate_task_patterns(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SrcTreeError::Config(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_cache_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.cache.skew_ms > MAX_SKEW_MS {
        return Err(SrcTreeError::Config(format!(
            "[cache].skew_ms must be <= {MAX_SKEW_MS} (got {})",
            cfg.cache.skew_ms
        )));
    }
    for pattern in &cfg.cache.fill {
        check_glob("[cache].fill", pattern)?;
    }
    Ok(())
}

fn validate_symlinks(cfg: &RawConfigFile) -> Result<()> {
    for (i, link) in cfg.symlink.iter().enumerate() {
        if link.real.as_os_str().is_empty() || link.alias.as_os_str().is_empty() {
            return Err(SrcTreeError::Config(format!(
                "[[symlink]] entry {i} needs both `real` and `alias`"
            )));
        }
    }
    Ok(())
}

fn validate_task_patterns(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.positive_patterns().next().is_none() {
            return Err(SrcTreeError::Config(format!(
                "task '{name}' needs at least one non-negated `src` pattern"
            )));
        }
        for pattern in &task.src {
            check_glob(&format!("task '{name}'"), pattern)?;
        }
    }
    Ok(())
}

fn check_glob(owner: &str, pattern: &str) -> Result<()> {
    let body = pattern.strip_prefix('!').unwrap_or(pattern);
    Glob::new(body).map_err(|source| {
        tracing::debug!(owner, pattern, "rejected glob");
        SrcTreeError::Glob {
            pattern: pattern.to_string(),
            source,
        }
    })?;
    Ok(())
}
