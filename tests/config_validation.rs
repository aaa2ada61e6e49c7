mod common;

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::TestResult;
use srctree::config::{load_and_validate, parse_and_validate};
use srctree::errors::SrcTreeError;
use srctree_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

const FULL: &str = r#"
[cache]
root = "site"
watch_mode = true
skew_ms = 120
state_file = "cache/state.toml"
fill = ["**/*.less", "**/*.ts"]

[[symlink]]
real = "node_modules/widgets"
alias = "../widgets"

[task.styles]
src = ["src/**/*.less", "!src/vendor/*.less"]
base = "src"

[task.bundle]
src = ["src/**/*.ts"]
all_or_nothing = true
always_pass_through = true
"#;

#[test]
fn full_config_parses_with_all_fields() -> TestResult {
    let cfg = parse_and_validate(FULL)?;

    let cache = cfg.cache();
    assert!(cache.watch_mode);
    assert_eq!(cache.skew(), Duration::from_millis(120));
    assert_eq!(cache.fill, vec!["**/*.less", "**/*.ts"]);
    assert_eq!(cache.resolved_root(Path::new("/work")), PathBuf::from("/work/site"));
    assert_eq!(
        cache.resolved_state_file(Path::new("/work")),
        PathBuf::from("/work/site/cache/state.toml")
    );

    assert_eq!(cfg.symlinks().len(), 1);
    assert_eq!(cfg.symlinks()[0].alias, PathBuf::from("../widgets"));

    let styles = cfg.task("styles").ok_or("styles missing")?;
    assert!(!styles.all_or_nothing);
    assert_eq!(styles.source_options().base, Some(PathBuf::from("src")));
    assert_eq!(styles.positive_patterns().collect::<Vec<_>>(), vec!["src/**/*.less"]);

    let bundle = cfg.task("bundle").ok_or("bundle missing")?;
    assert!(bundle.all_or_nothing);
    assert!(bundle.source_options().always_pass_through);

    let options = cfg.cache_options(Path::new("/work"));
    assert_eq!(options.root, PathBuf::from("/work/site"));
    assert!(options.watch_mode);
    Ok(())
}

#[test]
fn defaults_apply_when_cache_section_is_absent() -> TestResult {
    let cfg = parse_and_validate("[task.a]\nsrc = [\"*.js\"]\n")?;
    let cache = cfg.cache();
    assert!(!cache.watch_mode);
    assert_eq!(cache.skew_ms, 50);
    assert_eq!(cache.fill, vec!["**/*"]);
    assert_eq!(cache.state_file, PathBuf::from(".srctree/sections.toml"));
    Ok(())
}

#[test]
fn config_without_tasks_is_rejected() {
    let err = parse_and_validate("[cache]\nroot = \".\"\n").unwrap_err();
    assert!(matches!(err, SrcTreeError::Config(_)), "{err}");
}

#[test]
fn task_with_only_negations_is_rejected() {
    let task = TaskConfigBuilder::new("!*.js").build();
    let err = ConfigFileBuilder::new()
        .with_task("only_neg", task)
        .try_build()
        .unwrap_err();
    assert!(err.to_string().contains("only_neg"), "{err}");
}

#[test]
fn broken_glob_is_rejected() {
    let task = TaskConfigBuilder::new("src/[a.js").build();
    let err = ConfigFileBuilder::new()
        .with_task("t", task)
        .try_build()
        .unwrap_err();
    assert!(matches!(err, SrcTreeError::Glob { .. }), "{err}");
}

#[test]
fn skew_is_bounded() {
    let err = ConfigFileBuilder::new()
        .with_task("t", TaskConfigBuilder::new("*.js").build())
        .with_skew_ms(60_001)
        .try_build()
        .unwrap_err();
    assert!(err.to_string().contains("skew_ms"), "{err}");
}

#[test]
fn empty_symlink_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("t", TaskConfigBuilder::new("*.js").build())
        .with_symlink("", "alias")
        .try_build()
        .unwrap_err();
    assert!(matches!(err, SrcTreeError::Config(_)), "{err}");
}

#[test]
fn wrong_value_type_fails_to_parse() {
    let err = parse_and_validate("[task.a]\nsrc = \"*.js\"\n").unwrap_err();
    assert!(matches!(err, SrcTreeError::TomlDe(_)), "{err}");
}

#[test]
fn load_and_validate_reads_from_disk() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Srctree.toml");
    std::fs::write(&path, FULL)?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.tasks().len(), 2);

    let missing = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(missing, SrcTreeError::Io(_)));
    Ok(())
}
