mod common;

use std::path::PathBuf;

use common::{ROOT, T0, TestCache, TestResult, abs, init_tracing, rel_paths, with_timeout};
use srctree::errors::SrcTreeError;
use srctree::types::Timestamp;
use srctree::watch::WatchEvent;
use srctree_test_utils::SrcReport;

#[tokio::test]
async fn fill_reads_files_and_skips_directories() -> TestResult {
    init_tracing();
    let mut t = TestCache::new();
    t.write("a.ts", "alpha");
    t.write("src/deep/b.ts", "beta");

    let files: Vec<_> = with_timeout(t.cache.fill_cache("boot", &["**/*"], ROOT, false))
        .await?
        .collect();

    assert_eq!(rel_paths(files.clone()), vec!["a.ts", "src/deep/b.ts"]);
    // Results carry their payload; the tree keeps content-less copies.
    assert!(files.iter().all(|f| f.contents().is_some()));
    assert!(files.iter().all(|f| f.base == PathBuf::from(ROOT)));
    assert_eq!(t.cache.tree().file_count(), 2);
    let cached = t.cache.get_cached_file(abs("a.ts")).ok_or("missing")?;
    assert!(cached.contents().is_none());

    assert_eq!(
        t.reporter.last(),
        Some(SrcReport {
            task: "boot".into(),
            file_count: 2
        })
    );
    Ok(())
}

#[tokio::test]
async fn empty_read_set_completes_with_zero_files() -> TestResult {
    init_tracing();
    let mut t = TestCache::watch_mode();
    t.write("a.ts", "alpha");
    t.fill_all().await;

    let files = t.cache.fill_cache("fill", &["**/*"], ROOT, false).await?;
    assert_eq!(files.len(), 0);
    assert_eq!(t.reporter.counts_for("fill"), vec![1, 0]);

    let none: [&str; 0] = [];
    let files = t.cache.fill_cache("explicit", &none, ROOT, true).await?;
    assert_eq!(files.len(), 0);
    assert_eq!(t.reporter.counts_for("explicit"), vec![0]);
    Ok(())
}

#[tokio::test]
async fn watch_session_reads_only_changed_paths_and_stamps_them_now() -> TestResult {
    init_tracing();
    let mut t = TestCache::watch_mode();
    t.write("a.ts", "alpha");
    t.write("b.ts", "beta");
    t.write("src/c.ts", "gamma");
    t.fill_all().await;

    t.advance(1_000);
    // An old mtime on disk is overridden by the session.
    t.fs.add_file_with_mtime(abs("a.ts"), "alpha2", T0);
    t.write("new.ts", "delta");
    t.cache.handle_watch_event(WatchEvent::Changed(PathBuf::from("a.ts")));
    t.cache.handle_watch_event(WatchEvent::Added(abs("new.ts")));
    t.cache.handle_watch_event(WatchEvent::Changed(abs("src")));
    t.cache.handle_watch_event(WatchEvent::Changed(abs("gone.ts")));
    assert_eq!(t.cache.changed_paths().len(), 4);

    let files: Vec<_> = t.cache.fill_cache("fill", &["**/*"], ROOT, false).await?.collect();
    assert_eq!(rel_paths(files), vec!["a.ts", "new.ts"]);
    assert!(t.cache.changed_paths().is_empty());

    let now = Timestamp::from_millis(T0.as_millis() + 1_000);
    let a = t.cache.get_cached_file(abs("a.ts")).ok_or("missing")?;
    assert_eq!(a.mtime, now);
    let b = t.cache.get_cached_file(abs("b.ts")).ok_or("missing")?;
    assert_eq!(b.mtime, T0);
    assert_eq!(t.cache.last_fill(), Some(now));
    Ok(())
}

#[tokio::test]
async fn one_shot_refill_skips_files_older_than_previous_fill() -> TestResult {
    init_tracing();
    let mut t = TestCache::new();
    t.write("a.ts", "alpha");
    t.write("b.ts", "beta");
    assert_eq!(t.fill_all().await.len(), 2);

    t.advance(10);
    t.write("b.ts", "beta2");
    let again = t.fill_all().await;
    assert_eq!(again, vec![abs("b.ts")]);
    assert_eq!(t.cache.tree().file_count(), 2);
    Ok(())
}

#[tokio::test]
async fn add_mode_leaves_fill_bookkeeping_alone() -> TestResult {
    let mut t = TestCache::new();
    t.write("a.ts", "alpha");
    t.write("extra/z.md", "zeta");
    t.cache.handle_watch_event(WatchEvent::Changed(abs("a.ts")));

    let files: Vec<_> = t.cache.fill_cache("extra", &["extra/*.md"], ROOT, true).await?.collect();
    assert_eq!(rel_paths(files), vec!["extra/z.md"]);
    assert_eq!(t.cache.last_fill(), None);
    assert_eq!(t.cache.changed_paths().len(), 1);
    Ok(())
}

#[tokio::test]
async fn symlink_aliases_receive_clones_and_lose_them_on_removal() -> TestResult {
    init_tracing();
    let mut t = TestCache::new();
    t.cache.add_symlink("node_modules/widgets", "../widgets");
    t.cache.add_symlink("node_modules/widgets", "/mirror");
    t.write("node_modules/widgets/index.js", "export {}");
    t.write("other/index.js", "");
    t.fill_all().await;

    for alias in ["/widgets/index.js", "/mirror/index.js"] {
        let hit = t.cache.get_cached_file(alias).ok_or("alias missing")?;
        assert_eq!(hit.path, PathBuf::from(alias));
    }
    assert!(t.cache.get_cached_file("/widgets/other/index.js").is_none());

    t.cache.handle_watch_event(WatchEvent::Removed(PathBuf::from(
        "node_modules/widgets/index.js",
    )));
    assert!(t.cache.get_cached_file("/widgets/index.js").is_none());
    assert!(t.cache.get_cached_file("/mirror/index.js").is_none());
    assert!(t.cache.get_cached_file(abs("other/index.js")).is_some());
    Ok(())
}

#[tokio::test]
async fn touch_all_files_moves_mtimes_forward_and_clears_the_list() -> TestResult {
    init_tracing();
    let mut t = TestCache::new();
    t.write("a.js", "alpha");
    t.cache.reprocess_file_on_next_build("a.js");
    assert_eq!(t.cache.files_to_touch(), &[abs("a.js")]);

    t.advance(100);
    with_timeout(t.cache.touch_all_files()).await?;
    assert!(t.cache.files_to_touch().is_empty());

    t.fill_all().await;
    let a = t.cache.get_cached_file(abs("a.js")).ok_or("missing")?;
    assert_eq!(a.mtime, Timestamp::from_millis(T0.as_millis() + 100));
    Ok(())
}

#[tokio::test]
async fn touch_failures_are_aggregated() {
    init_tracing();
    let mut t = TestCache::new();
    for i in 0..40 {
        t.write(&format!("f{i}.js"), "x");
        t.cache.reprocess_file_on_next_build(format!("f{i}.js"));
    }
    t.fs.fail_touch(abs("f3.js"));
    t.cache.reprocess_file_on_next_build("missing.js");

    t.advance(100);
    let err = with_timeout(t.cache.touch_all_files()).await.unwrap_err();
    match err {
        SrcTreeError::Touch { failed, .. } => assert_eq!(failed, 2),
        other => panic!("unexpected error: {other}"),
    }

    // Every other touch still ran.
    t.fill_all().await;
    let touched = t
        .cache
        .matching_files(&["*.js"], &Default::default())
        .into_iter()
        .filter(|f| f.mtime > T0)
        .count();
    assert_eq!(touched, 39);
}

#[tokio::test]
async fn watch_session_touches_once_then_marks_changed() -> TestResult {
    let mut t = TestCache::watch_mode();
    t.write("a.js", "alpha");

    t.cache.reprocess_file_on_next_build("a.js");
    t.cache.touch_all_files().await?;
    assert!(t.cache.changed_paths().is_empty());

    t.cache.reprocess_file_on_next_build("a.js");
    t.cache.touch_all_files().await?;
    assert!(t.cache.changed_paths().contains(&abs("a.js")));
    assert!(t.cache.files_to_touch().is_empty());
    Ok(())
}

#[tokio::test]
async fn removal_drops_alias_clones_whatever_the_case() -> TestResult {
    let mut t = TestCache::new();
    t.cache.add_symlink("node_modules/widgets", "/mirror");
    t.write("node_modules/widgets/index.js", "export {}");
    t.fill_all().await;
    assert!(t.cache.get_cached_file("/mirror/index.js").is_some());

    t.cache.handle_watch_event(WatchEvent::Removed(PathBuf::from(
        "NODE_MODULES/Widgets/index.js",
    )));
    assert!(t.cache.get_cached_file("/mirror/index.js").is_none());
    assert!(t.cache.get_cached_file(abs("node_modules/widgets/index.js")).is_none());
    Ok(())
}

#[tokio::test]
async fn cached_file_lookup_is_exact() -> TestResult {
    let mut t = TestCache::new();
    t.write("Makefile", "all:");
    t.write("a.js", "alpha");
    t.fill_all().await;

    let make = t.cache.get_cached_file(abs("Makefile")).ok_or("Makefile missing")?;
    assert_eq!(make.path, abs("Makefile"));
    assert!(make.contents().is_none());
    // Relative paths resolve against the root; keys ignore case.
    assert!(t.cache.get_cached_file("makefile").is_some());
    // Glob syntax is taken literally.
    assert!(t.cache.get_cached_file(abs("*.js")).is_none());
    Ok(())
}
