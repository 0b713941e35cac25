use crate::integration::init_tracing;
use crate::utils::{MockStreamer, eventually, test_source};
use geocast_server::RelayError;
use geocast_server::recording::{RecordingRegistry, Streamer};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::advance;

const STALE_AFTER: Duration = Duration::from_millis(300_000);

fn registry(streamer: &Arc<MockStreamer>) -> RecordingRegistry {
    RecordingRegistry::new(
        Arc::clone(streamer) as Arc<dyn Streamer>,
        PathBuf::from("recordings"),
        STALE_AFTER,
    )
}

fn counting_delivery() -> (Arc<AtomicUsize>, Arc<Mutex<Option<PathBuf>>>) {
    (
        Arc::new(AtomicUsize::new(0)),
        Arc::new(Mutex::new(None)),
    )
}

#[tokio::test]
async fn delivery_fires_exactly_once_with_file_path() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = registry(&streamer);
    let source = test_source("s1", true);

    let session = registry.start_recording(&source).await.unwrap();
    assert!(!session.is_ready());

    let (fired, delivered) = counting_delivery();
    registry
        .attach_delivery(&"s1".into(), {
            let fired = Arc::clone(&fired);
            let delivered = Arc::clone(&delivered);
            Box::new(move |path| {
                fired.fetch_add(1, Ordering::SeqCst);
                *delivered.lock().unwrap() = Some(path);
            })
        })
        .unwrap();

    streamer.emit_exit(&source.locator, Some(0)).await;
    eventually(|| fired.load(Ordering::SeqCst) == 1).await;

    assert!(session.is_ready());
    assert!(session.is_closed());
    assert_eq!(
        delivered.lock().unwrap().as_deref(),
        Some(PathBuf::from("recordings/s1.mp4").as_path())
    );

    // a duplicate exit event must not re-fire the delivery
    streamer.emit_exit(&source.locator, Some(0)).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn attach_after_exit_fires_synchronously() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = registry(&streamer);
    let source = test_source("s1", true);

    let session = registry.start_recording(&source).await.unwrap();
    streamer.emit_exit(&source.locator, Some(0)).await;
    eventually(|| session.is_ready()).await;
    assert!(!session.is_closed());

    let (fired, _) = counting_delivery();
    registry
        .attach_delivery(&"s1".into(), {
            let fired = Arc::clone(&fired);
            Box::new(move |_| {
                fired.fetch_add(1, Ordering::SeqCst);
            })
        })
        .unwrap();

    // already ready, so delivery happened inside attach_delivery
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(session.is_closed());
}

#[tokio::test]
async fn process_error_leaves_session_not_ready() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = registry(&streamer);
    let source = test_source("s1", true);

    let session = registry.start_recording(&source).await.unwrap();
    streamer.emit_error(&source.locator, "connection refused").await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!session.is_ready());
    assert!(!session.is_closed());
    assert!(registry.contains(&"s1".into()));
}

#[tokio::test(start_paused = true)]
async fn staleness_flips_exactly_at_the_threshold() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = registry(&streamer);
    let session = registry
        .start_recording(&test_source("s1", true))
        .await
        .unwrap();

    advance(Duration::from_millis(299_999)).await;
    assert!(!session.is_stale());

    advance(Duration::from_millis(1)).await;
    assert!(session.is_stale());
}

#[tokio::test(start_paused = true)]
async fn sweep_removes_closed_and_stale_but_keeps_fresh() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = registry(&streamer);

    let stale = test_source("stale", true);
    registry.start_recording(&stale).await.unwrap();
    advance(Duration::from_secs(400)).await;

    let closed = test_source("closed", true);
    let fresh = test_source("fresh", true);
    let closed_session = registry.start_recording(&closed).await.unwrap();
    registry.start_recording(&fresh).await.unwrap();

    registry
        .attach_delivery(&"closed".into(), Box::new(|_| {}))
        .unwrap();
    streamer.emit_exit(&closed.locator, Some(0)).await;
    eventually(|| closed_session.is_closed()).await;

    registry.sweep();

    assert_eq!(registry.len(), 1);
    assert!(registry.contains(&"fresh".into()));
}

#[tokio::test(start_paused = true)]
async fn late_exit_after_eviction_is_a_noop() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = registry(&streamer);
    let source = test_source("s1", true);

    let session = registry.start_recording(&source).await.unwrap();
    advance(Duration::from_secs(400)).await;
    registry.sweep();
    assert!(registry.is_empty());

    // the watcher still owns the process events; a late exit lands in the
    // evicted session without delivering anywhere
    streamer.emit_exit(&source.locator, Some(0)).await;
    eventually(|| session.is_ready()).await;
    assert!(!session.is_closed());

    let err = registry
        .attach_delivery(&"s1".into(), Box::new(|_| {}))
        .unwrap_err();
    assert!(matches!(err, RelayError::UnknownSession(_)));
}

#[tokio::test]
async fn duplicate_start_is_rejected_while_session_is_live() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = registry(&streamer);
    let source = test_source("s1", true);

    let session = registry.start_recording(&source).await.unwrap();
    let err = registry.start_recording(&source).await.unwrap_err();
    assert!(matches!(err, RelayError::AlreadyRecording(_)));
    assert_eq!(streamer.start_count(), 1);

    // once delivered, the id may record again
    registry
        .attach_delivery(&"s1".into(), Box::new(|_| {}))
        .unwrap();
    streamer.emit_exit(&source.locator, Some(0)).await;
    eventually(|| session.is_closed()).await;

    registry.start_recording(&source).await.unwrap();
    assert_eq!(streamer.start_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sweep_tolerates_concurrent_inserts() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = Arc::new(registry(&streamer));

    let sweeper = tokio::spawn({
        let registry = Arc::clone(&registry);
        async move {
            for _ in 0..500 {
                registry.sweep();
                tokio::task::yield_now().await;
            }
        }
    });
    let inserter = tokio::spawn({
        let registry = Arc::clone(&registry);
        async move {
            for i in 0..200 {
                let source = test_source(&format!("s{i}"), true);
                registry.start_recording(&source).await.unwrap();
                tokio::task::yield_now().await;
            }
        }
    });

    inserter.await.unwrap();
    sweeper.await.unwrap();

    // every session is fresh, so nothing was swept away
    assert_eq!(registry.len(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_starts_for_one_source_spawn_one_process() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    streamer.delay_starts(Duration::from_millis(25));
    let registry = Arc::new(registry(&streamer));
    let source = test_source("s1", true);

    let first = tokio::spawn({
        let registry = Arc::clone(&registry);
        let source = source.clone();
        async move { registry.start_recording(&source).await }
    });
    let second = tokio::spawn({
        let registry = Arc::clone(&registry);
        let source = source.clone();
        async move { registry.start_recording(&source).await }
    });

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|o| matches!(o, Err(RelayError::AlreadyRecording(_))))
    );
    assert_eq!(streamer.start_count(), 1);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn failed_spawn_registers_nothing() {
    init_tracing();
    let streamer = Arc::new(MockStreamer::new());
    let registry = registry(&streamer);

    streamer.fail_next_start();
    let err = registry
        .start_recording(&test_source("s1", true))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Spawn(_)));
    assert!(registry.is_empty());
}
