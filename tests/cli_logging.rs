use clap::Parser;
use srctree::cli::{CliArgs, Command, LogLevel};
use srctree::logging::build_filter;

#[test]
fn cli_flag_beats_env_var() -> anyhow::Result<()> {
    let filter = build_filter(Some(LogLevel::Debug), Some("warn"))?;
    assert_eq!(filter.to_string(), "debug");
    Ok(())
}

#[test]
fn env_var_is_used_as_a_directive() -> anyhow::Result<()> {
    let filter = build_filter(None, Some("srctree::glob=trace,info"))?;
    let text = filter.to_string();
    assert!(text.contains("srctree::glob=trace"), "got {text}");
    Ok(())
}

#[test]
fn blank_env_var_falls_back_to_info() -> anyhow::Result<()> {
    assert_eq!(build_filter(None, Some("  "))?.to_string(), "info");
    assert_eq!(build_filter(None, None)?.to_string(), "info");
    Ok(())
}

#[test]
fn malformed_env_var_is_rejected() {
    let err = build_filter(None, Some("srctree=notalevel")).unwrap_err();
    assert!(err.to_string().contains("SRCTREE_LOG"));
}

#[test]
fn global_flags_parse_after_the_subcommand() {
    let args = CliArgs::parse_from([
        "srctree",
        "ls",
        "src/**/*.ts",
        "!src/gen/*.ts",
        "--config",
        "other.toml",
        "--log-level",
        "trace",
    ]);
    assert_eq!(args.config, "other.toml");
    assert!(matches!(args.log_level, Some(LogLevel::Trace)));
    match args.command {
        Command::Ls { patterns } => assert_eq!(patterns, vec!["src/**/*.ts", "!src/gen/*.ts"]),
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn ls_requires_a_pattern() {
    assert!(CliArgs::try_parse_from(["srctree", "ls"]).is_err());
}
