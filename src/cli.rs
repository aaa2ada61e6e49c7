// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `srctree`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "srctree",
    version,
    about = "In-memory source cache with glob lookups and incremental change tracking.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Srctree.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SRCTREE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Fill the cache and list the files matching the given globs.
    Ls {
        #[arg(required = true, value_name = "GLOB")]
        patterns: Vec<String>,
    },
    /// List the files a configured task would process, then record the run.
    Changed {
        #[arg(value_name = "TASK")]
        task: String,
    },
    /// List cached outputs whose source no longer exists.
    Deleted {
        #[arg(required = true, value_name = "GLOB")]
        patterns: Vec<String>,
    },
    /// Force files to be treated as changed by the next run.
    Touch {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Keep the cache alive and report per-task changes as files change.
    Watch,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
