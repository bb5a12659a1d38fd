mod support;

use std::collections::HashMap;
use std::time::Duration;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use remote_pager::RemoteLoader;
use tokio::time::sleep;

use support::{Reply, ScriptedSource, options};

#[tokio::test(start_paused = true)]
async fn loader_paths_emit_expected_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // Two misses, one hit, one eviction.
    let source = ScriptedSource::pages(5);
    let loader = RemoteLoader::new(options(&source).with_cache_pages(1));
    assert!(loader.fetch("q", 1, true).await.is_loaded());
    assert!(loader.fetch("q", 1, true).await.is_loaded());
    assert!(loader.fetch("q", 2, true).await.is_loaded());

    // One cancellation.
    let slow = ScriptedSource::pages(1).with_query_latency("slow", Duration::from_millis(500));
    let cancelling = RemoteLoader::new(options(&slow));
    let superseded = cancelling.fetch("slow", 1, true);
    sleep(Duration::from_millis(10)).await;
    assert!(cancelling.fetch("fast", 1, true).await.is_loaded());
    assert!(superseded.await.is_cancelled());

    // One transport failure.
    let failing = RemoteLoader::new(options(&ScriptedSource::new(Reply::Status(500))));
    assert!(!failing.fetch("q", 1, true).await.is_loaded());

    let mut counters: HashMap<String, u64> = HashMap::new();
    let mut names = Vec::new();
    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let name = composite_key.key().name().to_string();
        if let DebugValue::Counter(count) = value {
            *counters.entry(name.clone()).or_default() += count;
        }
        names.push(name);
    }

    assert_eq!(counters.get("pager_cache_hit_total"), Some(&1));
    assert_eq!(counters.get("pager_cache_miss_total"), Some(&5));
    assert_eq!(counters.get("pager_fetch_started_total"), Some(&5));
    assert_eq!(counters.get("pager_cache_evict_total"), Some(&1));
    assert_eq!(counters.get("pager_fetch_cancelled_total"), Some(&1));
    assert_eq!(counters.get("pager_fetch_failed_total"), Some(&1));
    assert!(
        names.iter().any(|name| name == "pager_fetch_ms"),
        "missing metric: pager_fetch_ms"
    );
}
