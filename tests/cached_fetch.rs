//! Integration tests for the TTL cache and the cached fetch orchestrator
//!
//! Sources are scripted in-process doubles; time is controlled with a
//! `ManualClock` for expiry and tokio's paused clock for overlapping calls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::Poll;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use portfolio_feeds::cache::{ManualClock, MemoryStore, TtlCache};
use portfolio_feeds::fetch::{interpret_envelope, CachedFetch, FetchError, FetchOptions, Source};

const START: i64 = 1_700_000_000_000;

/// Replays scripted HTTP answers, each after its own delay
struct ScriptedSource {
    calls: AtomicUsize,
    script: Mutex<VecDeque<(Duration, u16, String)>>,
}

impl ScriptedSource {
    fn new(script: Vec<(Duration, u16, Value)>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|(delay, status, body)| (delay, status, body.to_string()))
                    .collect(),
            ),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source<Value> for ScriptedSource {
    async fn fetch(&self) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let (delay, status, body) = next.expect("source called more often than scripted");
        tokio::time::sleep(delay).await;
        interpret_envelope(status, &body)
    }
}

fn test_cache() -> (TtlCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let cache = TtlCache::new(Arc::new(MemoryStore::new())).with_clock(clock.clone());
    (cache, clock)
}

fn options(key: &str, source: Arc<dyn Source<Value>>) -> FetchOptions<Value> {
    FetchOptions::new(key, source)
}

#[test]
fn test_set_then_get_for_several_ttls() {
    let (cache, _clock) = test_cache();
    for hours in [1u64, 6, 24, 24 * 30] {
        let key = format!("k{}", hours);
        let data = json!({"videos": [hours]});
        cache.set(&key, &data, hours);
        assert_eq!(cache.get::<Value>(&key), Some(data));
    }
}

#[test]
fn test_entry_expires_after_ttl() {
    let (cache, clock) = test_cache();
    cache.set("k", &json!({"videos": []}), 3);

    clock.advance_millis(3 * 3_600_000 + 1);

    assert_eq!(cache.get::<Value>("k"), None);
    assert!(!cache.has("k"));
}

#[test]
fn test_remove_and_clear_make_keys_absent() {
    let (cache, _clock) = test_cache();
    cache.set("a", &json!(1), 24);
    cache.set("b", &json!(2), 24);

    cache.remove("a");
    assert_eq!(cache.get::<Value>("a"), None);

    cache.clear();
    assert_eq!(cache.get::<Value>("b"), None);
}

#[tokio::test]
async fn test_warm_cache_never_calls_source() {
    let (cache, _clock) = test_cache();
    let cached = json!({"videos": ["cached"]});
    cache.set("youtube_latest_videos", &cached, 24);
    let source = ScriptedSource::new(vec![]);
    let fetch = CachedFetch::new(cache.clone(), options("youtube_latest_videos", source.clone()));

    let state = fetch.load().await;

    assert_eq!(source.calls(), 0);
    assert_eq!(state.data, Some(cached));
    assert_eq!(state.error, None);
    assert!(!state.loading);
    assert_eq!(cache.metrics().snapshot().cache_hits, 1);
}

#[tokio::test]
async fn test_cold_cache_success_is_stored() {
    let (cache, _clock) = test_cache();
    let body = json!({"videos": [{"id": "a1"}], "message": "ok"});
    let source = ScriptedSource::new(vec![(Duration::ZERO, 200, body.clone())]);
    let fetch = CachedFetch::new(cache.clone(), options("k", source.clone()));

    let state = fetch.load().await;

    assert_eq!(source.calls(), 1);
    assert_eq!(state.data, Some(body.clone()));
    assert_eq!(state.error, None);
    assert!(!state.loading);
    assert_eq!(cache.get::<Value>("k"), Some(body));
    assert_eq!(cache.metrics().snapshot().cache_writes, 1);
}

#[tokio::test]
async fn test_cold_cache_http_500_uses_fallback_and_caches_nothing() {
    let (cache, _clock) = test_cache();
    let fallback = json!({"videos": ["placeholder"]});
    let source = ScriptedSource::new(vec![(Duration::ZERO, 500, json!("Internal Server Error"))]);
    let fetch = CachedFetch::new(
        cache.clone(),
        options("k", source).with_fallback(fallback.clone()),
    );

    let state = fetch.load().await;

    assert_eq!(state.data, Some(fallback));
    assert_eq!(state.error.as_deref(), Some("HTTP error! status: 500"));
    assert!(!state.loading);
    assert!(!cache.has("k"));
    assert_eq!(cache.metrics().snapshot().cache_writes, 0);
}

#[tokio::test]
async fn test_upstream_error_field_is_a_failure() {
    let (cache, _clock) = test_cache();
    let source = ScriptedSource::new(vec![(
        Duration::ZERO,
        200,
        json!({"error": "Failed to fetch latest videos", "message": "quota exceeded", "videos": []}),
    )]);
    let fetch = CachedFetch::new(cache.clone(), options("k", source));

    let state = fetch.load().await;

    assert_eq!(state.error.as_deref(), Some("quota exceeded"));
    assert_eq!(state.data, None);
    assert!(!cache.has("k"));
}

#[tokio::test]
async fn test_expired_entry_triggers_network_fetch() {
    let (cache, clock) = test_cache();
    cache.set("k", &json!({"videos": ["old"]}), 1);
    clock.advance_hours(2);
    let fresh = json!({"videos": ["new"]});
    let source = ScriptedSource::new(vec![(Duration::ZERO, 200, fresh.clone())]);
    let fetch = CachedFetch::new(cache.clone(), options("k", source.clone()));

    let state = fetch.load().await;

    assert_eq!(source.calls(), 1);
    assert_eq!(state.data, Some(fresh));
    let info = cache.info("k").unwrap();
    assert_eq!(info.stored_at, START + 2 * 3_600_000);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_refetches_keep_the_later_result_when_it_finishes_first() {
    let (cache, _clock) = test_cache();
    let source = ScriptedSource::new(vec![
        (Duration::from_millis(300), 200, json!({"videos": ["first"]})),
        (Duration::from_millis(50), 200, json!({"videos": ["second"]})),
    ]);
    let fetch = CachedFetch::new(cache.clone(), options("k", source.clone()));

    let mut first = Box::pin(fetch.refetch());
    assert!(matches!(futures::poll!(first.as_mut()), Poll::Pending));
    let mut second = Box::pin(fetch.refetch());
    assert!(matches!(futures::poll!(second.as_mut()), Poll::Pending));
    assert!(fetch.state().loading);

    let (_, _) = futures::join!(first, second);

    let state = fetch.state();
    assert_eq!(state.data, Some(json!({"videos": ["second"]})));
    assert!(!state.loading);
    assert_eq!(cache.get::<Value>("k"), Some(json!({"videos": ["second"]})));
    assert_eq!(cache.metrics().snapshot().stale_responses, 1);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_refetches_drop_the_earlier_result_when_it_finishes_first() {
    let (cache, _clock) = test_cache();
    let source = ScriptedSource::new(vec![
        (Duration::from_millis(50), 200, json!({"videos": ["first"]})),
        (Duration::from_millis(300), 200, json!({"videos": ["second"]})),
    ]);
    let fetch = CachedFetch::new(cache.clone(), options("k", source.clone()));

    let mut first = Box::pin(fetch.refetch());
    assert!(matches!(futures::poll!(first.as_mut()), Poll::Pending));
    let mut second = Box::pin(fetch.refetch());
    assert!(matches!(futures::poll!(second.as_mut()), Poll::Pending));

    let early = first.await;
    assert_eq!(early.data, None, "stale result must not be applied");
    assert!(early.loading, "the later call is still in flight");
    assert!(!cache.has("k"), "stale result must not be cached");

    second.await;

    let state = fetch.state();
    assert_eq!(state.data, Some(json!({"videos": ["second"]})));
    assert!(!state.loading);
    assert_eq!(cache.get::<Value>("k"), Some(json!({"videos": ["second"]})));
}

#[tokio::test(start_paused = true)]
async fn test_retarget_while_loading_discards_old_key_result() {
    let (cache, _clock) = test_cache();
    let slow = ScriptedSource::new(vec![(Duration::from_millis(500), 200, json!({"channel": "old"}))]);
    let fast = ScriptedSource::new(vec![(Duration::from_millis(10), 200, json!({"channel": "new"}))]);
    let fetch = CachedFetch::new(cache.clone(), options("channel_old", slow.clone()));

    let mut pending = Box::pin(fetch.load());
    assert!(matches!(futures::poll!(pending.as_mut()), Poll::Pending));

    let switched = fetch.retarget("channel_new", fast.clone()).await;
    assert_eq!(switched.data, Some(json!({"channel": "new"})));

    pending.await;

    assert_eq!(fetch.state().data, Some(json!({"channel": "new"})));
    assert!(!cache.has("channel_old"));
    assert!(cache.has("channel_new"));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_latest_call_does_not_leave_loading_stuck() {
    let (cache, _clock) = test_cache();
    let source = ScriptedSource::new(vec![
        (Duration::from_millis(100), 200, json!({"videos": ["first"]})),
        (Duration::from_millis(100), 200, json!({"videos": ["second"]})),
    ]);
    let fallback = json!({"videos": ["placeholder"]});
    let fetch = CachedFetch::new(
        cache.clone(),
        options("k", source.clone()).with_fallback(fallback.clone()),
    );

    let mut first = Box::pin(fetch.load());
    assert!(matches!(futures::poll!(first.as_mut()), Poll::Pending));
    let mut second = Box::pin(fetch.refetch());
    assert!(matches!(futures::poll!(second.as_mut()), Poll::Pending));
    drop(second);

    let state = fetch.state();
    assert!(!state.loading, "cancelled latest call must end loading");
    assert_eq!(state.data, Some(fallback.clone()));

    first.await;
    tokio::time::sleep(Duration::from_secs(60)).await;

    let state = fetch.state();
    assert!(!state.loading);
    assert_eq!(state.data, Some(fallback));
    assert!(!cache.has("k"), "superseded result must not be cached");
}

#[tokio::test(start_paused = true)]
async fn test_dropping_an_older_call_leaves_the_latest_in_charge() {
    let (cache, _clock) = test_cache();
    let source = ScriptedSource::new(vec![
        (Duration::from_millis(100), 200, json!({"videos": ["first"]})),
        (Duration::from_millis(100), 200, json!({"videos": ["second"]})),
    ]);
    let fetch = CachedFetch::new(cache.clone(), options("k", source.clone()));

    let mut first = Box::pin(fetch.load());
    assert!(matches!(futures::poll!(first.as_mut()), Poll::Pending));
    let second = fetch.refetch();
    drop(first);

    let state = second.await;
    assert!(!state.loading);
    assert_eq!(state.data, Some(json!({"videos": ["second"]})));
}
