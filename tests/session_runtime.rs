mod common;

use std::path::PathBuf;

use common::{T0, TestCache, TestResult, abs, init_tracing, with_timeout};
use srctree::cache::TaskEvent;
use srctree::engine::{CoreCommand, Runtime, RuntimeEvent, SessionCore, TaskReport};
use srctree::sections::{FileSectionStore, MemorySectionStore, SectionStore, TASK_START_TIMES_SECTION};
use srctree::watch::WatchEvent;
use srctree_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use tokio::sync::mpsc;

fn config() -> srctree::config::ConfigFile {
    ConfigFileBuilder::new()
        .with_task("styles", TaskConfigBuilder::new("*.less").build())
        .with_task("scripts", TaskConfigBuilder::new("*.ts").all_or_nothing().build())
        .watch_mode(true)
        .build()
}

#[test]
fn core_requests_one_rebuild_per_batch_with_changes() {
    let mut core = SessionCore::new();
    let change = WatchEvent::Changed(PathBuf::from("a.less"));

    let step = core.step(RuntimeEvent::Watch(change.clone()));
    assert_eq!(step.commands, vec![CoreCommand::ApplyWatch(change)]);
    core.step(RuntimeEvent::Watch(WatchEvent::Added(PathBuf::from("b.less"))));
    assert_eq!(core.pending_changes(), 2);

    let step = core.step(RuntimeEvent::BatchEnd);
    assert_eq!(step.commands, vec![CoreCommand::Rebuild]);
    assert!(step.keep_running);
    assert_eq!(core.pending_changes(), 0);

    assert!(core.step(RuntimeEvent::BatchEnd).commands.is_empty());

    let failed = TaskEvent::Errored("styles".into());
    let step = core.step(RuntimeEvent::Task(failed.clone()));
    assert_eq!(step.commands, vec![CoreCommand::ApplyTask(failed)]);
    assert!(core.step(RuntimeEvent::BatchEnd).commands.is_empty());

    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert_eq!(step.commands, vec![CoreCommand::RequestExit]);
    assert!(!step.keep_running);
    assert_eq!(core.rebuilds(), 1);
}

#[tokio::test]
async fn batches_rebuild_only_the_tasks_with_changes() -> TestResult {
    init_tracing();
    let TestCache {
        cache, fs, clock, ..
    } = TestCache::watch_mode();
    fs.add_file(abs("a.less"), "v1");
    fs.add_file(abs("b.ts"), "v1");

    let (_tx, rx) = mpsc::channel(4);
    let mut runtime = Runtime::new(cache, config(), Box::new(MemorySectionStore::new()), rx);

    let first = with_timeout(runtime.rebuild()).await?;
    assert_eq!(
        first,
        vec![
            TaskReport {
                task: "scripts".into(),
                files: vec![abs("b.ts")]
            },
            TaskReport {
                task: "styles".into(),
                files: vec![abs("a.less")]
            },
        ]
    );
    assert_eq!(runtime.cache().task_times().last_run("styles"), Some(T0));

    clock.advance(std::time::Duration::from_millis(100));
    fs.add_file(abs("a.less"), "v2");
    let outcome = with_timeout(runtime.handle_batch(vec![RuntimeEvent::Watch(
        WatchEvent::Changed(abs("a.less")),
    )]))
    .await?;
    assert!(outcome.keep_running);
    assert_eq!(
        outcome.reports,
        vec![TaskReport {
            task: "styles".into(),
            files: vec![abs("a.less")]
        }]
    );

    let idle = runtime.handle_batch(Vec::new()).await?;
    assert!(idle.reports.is_empty());

    let stop = runtime
        .handle_batch(vec![RuntimeEvent::ShutdownRequested])
        .await?;
    assert!(!stop.keep_running);
    Ok(())
}

#[tokio::test]
async fn run_saves_sections_on_shutdown() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let state = dir.path().join("sections.toml");

    let t = TestCache::watch_mode();
    t.write("a.less", "v1");

    let (tx, rx) = mpsc::channel(4);
    tx.send(RuntimeEvent::ShutdownRequested).await?;
    let runtime = Runtime::new(t.cache, config(), Box::new(FileSectionStore::new(&state)), rx);

    let cache = with_timeout(runtime.run()).await?;
    assert_eq!(cache.task_times().last_run("styles"), Some(T0));

    let stored = FileSectionStore::new(&state).load(TASK_START_TIMES_SECTION)?;
    assert!(stored.is_some());
    Ok(())
}

#[tokio::test]
async fn run_ends_when_every_sender_is_gone() -> TestResult {
    let t = TestCache::watch_mode();
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(1);
    drop(tx);
    let runtime = Runtime::new(t.cache, config(), Box::new(MemorySectionStore::new()), rx);
    with_timeout(runtime.run()).await?;
    Ok(())
}
