mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{TestResult, init_tracing, with_timeout};
use srctree::cache::{CacheOptions, SourceCache};
use srctree::clock::SystemClock;
use srctree::errors::SrcTreeError;
use srctree::fs::{FileSystem, RealFileSystem};
use srctree::source::read_sources;
use srctree::types::SourceOptions;
use srctree_test_utils::RecordingReporter;

fn write(root: &Path, rel: &str, contents: &str) -> TestResult {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

fn real_cache(root: &Path) -> (SourceCache, RecordingReporter) {
    let reporter = RecordingReporter::new();
    let cache = SourceCache::new(
        CacheOptions::new(root),
        Arc::new(RealFileSystem),
        Arc::new(SystemClock),
        Arc::new(reporter.clone()),
    );
    (cache, reporter)
}

#[tokio::test]
async fn fill_and_query_against_a_real_directory() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    write(&root, "src/app.ts", "export const a = 1;")?;
    write(&root, "src/util/strings.ts", "export {}")?;
    write(&root, "src/style.less", "@a: 1;")?;
    write(&root, "README.md", "# hi")?;

    let (mut cache, reporter) = real_cache(&root);
    let files: Vec<_> = with_timeout(cache.fill_cache("fill", &["src/**/*"], &root, false))
        .await?
        .collect();
    assert_eq!(files.len(), 3);
    let app = files
        .iter()
        .find(|f| f.path.ends_with("app.ts"))
        .ok_or("app.ts not read")?;
    assert_eq!(app.contents(), Some(&b"export const a = 1;"[..]));
    assert_eq!(reporter.counts_for("fill"), vec![3]);

    let ts = cache.cache_src("ts", &["src/**/*.ts"], &SourceOptions::default());
    assert_eq!(ts.len(), 2);
    assert!(cache.get_cached_file(root.join("README.md")).is_none());
    Ok(())
}

#[tokio::test]
async fn touch_uses_the_real_mtime() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    write(&root, "a.js", "1")?;
    let path = root.join("a.js");

    let old = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
    fs::File::options().write(true).open(&path)?.set_modified(old)?;

    let (mut cache, _) = real_cache(&root);
    cache.reprocess_file_on_next_build(&path);
    with_timeout(cache.touch_all_files()).await?;

    let meta = RealFileSystem.metadata(&path)?;
    assert!(meta.mtime.to_system_time() > old);
    Ok(())
}

#[tokio::test]
async fn touching_a_missing_file_fails_without_creating_it() -> TestResult {
    let dir = tempfile::tempdir()?;
    let (mut cache, _) = real_cache(dir.path());
    cache.reprocess_file_on_next_build("ghost.js");

    let err = with_timeout(cache.touch_all_files()).await.unwrap_err();
    assert!(matches!(err, SrcTreeError::Touch { failed: 1, .. }), "{err}");
    assert!(!dir.path().join("ghost.js").exists());
    Ok(())
}

#[test]
fn read_sources_applies_exclusions_and_literal_rules() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    write(&root, "lib/a.js", "a")?;
    write(&root, "lib/b.js", "b")?;
    write(&root, "lib/vendor/c.js", "c")?;

    let mut seen = Vec::new();
    let count = read_sources(
        &RealFileSystem,
        &root,
        &["lib/**/*.js", "!lib/vendor/**", "lib/a.js"],
        &SourceOptions::default(),
        |entry| seen.push(entry.path),
    )?;
    seen.sort();
    assert_eq!(count, 2);
    assert_eq!(seen, vec![root.join("lib/a.js"), root.join("lib/b.js")]);

    let err = read_sources(
        &RealFileSystem,
        &root,
        &["lib/missing.js"],
        &SourceOptions::default(),
        |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, SrcTreeError::NotFound(_)));

    let allowed = SourceOptions::default().allow_empty(true);
    assert_eq!(
        read_sources(&RealFileSystem, &root, &["lib/missing.js"], &allowed, |_| {})?,
        0
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_followed_only_on_request() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    write(&root, "real/x.js", "x")?;
    fs::create_dir_all(root.join("src"))?;
    std::os::unix::fs::symlink(root.join("real"), root.join("src/linked"))?;
    // A link back up must not loop.
    std::os::unix::fs::symlink(&root, root.join("real/up"))?;

    let collect = |follow: bool| -> Result<Vec<String>, SrcTreeError> {
        let mut names = Vec::new();
        let options = SourceOptions::default().follow(follow);
        read_sources(&RealFileSystem, &root, &["src/**/*.js"], &options, |e| {
            names.push(e.path.strip_prefix(&root).unwrap().to_string_lossy().into_owned())
        })?;
        Ok(names)
    };

    assert!(collect(false)?.is_empty());
    assert_eq!(collect(true)?, vec!["src/linked/x.js"]);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn dangling_links_outside_the_pattern_are_skipped() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    write(&root, "a.js", "a")?;
    std::os::unix::fs::symlink(root.join("gone"), root.join("broken"))?;

    let (mut cache, _) = real_cache(&root);
    let files: Vec<_> = with_timeout(cache.fill_cache("fill", &["**/*.js"], &root, false))
        .await?
        .collect();
    assert_eq!(files.len(), 1);
    assert!(cache.get_cached_file(root.join("a.js")).is_some());
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_match_fails_the_fill_without_touching_the_cache() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    write(&root, "a.js", "a")?;
    std::os::unix::fs::symlink(root.join("gone.js"), root.join("b.js"))?;

    let (mut cache, _) = real_cache(&root);
    let result = with_timeout(cache.fill_cache("fill", &["**/*.js"], &root, false)).await;
    assert!(result.is_err());
    assert_eq!(cache.tree().file_count(), 0);
    assert_eq!(cache.last_fill(), None);
    Ok(())
}
