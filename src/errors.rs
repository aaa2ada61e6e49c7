// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SrcTreeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid glob pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("File not found with singular glob: {0:?}")]
    NotFound(PathBuf),

    #[error("failed to touch {failed} file(s), first failure at {path:?}: {source}")]
    Touch {
        path: PathBuf,
        failed: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Section error ({name}): {reason}")]
    Section { name: String, reason: String },

    #[error("TOML parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SrcTreeError>;
