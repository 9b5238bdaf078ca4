use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use uxlens_lib::commands::compare::{CompareOutcome, ComparisonSession, ComparisonSource};
use uxlens_lib::commands::settings::{get_settings, load_effective_settings, save_settings};
use uxlens_lib::commands::versions::{VersionSource, VersionsProvider};
use uxlens_lib::models::comparison::ComparisonThresholds;
use uxlens_lib::models::issue::IssueStatus;
use uxlens_lib::models::version::{Version, VersionPair};

type Reply = Result<Value, String>;

/// Responses are released by the test through oneshot senders.
struct GatedSource {
    pending: Mutex<HashMap<(i64, i64), oneshot::Receiver<Reply>>>,
    started: mpsc::UnboundedSender<(i64, i64)>,
}

impl GatedSource {
    fn new() -> (Self, mpsc::UnboundedReceiver<(i64, i64)>) {
        let (started, started_rx) = mpsc::unbounded_channel();
        let source = Self {
            pending: Mutex::new(HashMap::new()),
            started,
        };
        (source, started_rx)
    }

    fn expect(&self, v1: i64, v2: i64) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().expect("pending lock").insert((v1, v2), rx);
        tx
    }
}

impl ComparisonSource for GatedSource {
    fn fetch_comparison(&self, v1: i64, v2: i64) -> impl Future<Output = Reply> + Send {
        let receiver = self.pending.lock().expect("pending lock").remove(&(v1, v2));
        let _ = self.started.send((v1, v2));
        async move {
            match receiver {
                Some(rx) => rx.await.unwrap_or_else(|_| Err("response dropped".to_string())),
                None => Err(format!("no response for {v1}/{v2}")),
            }
        }
    }
}

struct FixedSource(Reply);

impl ComparisonSource for FixedSource {
    fn fetch_comparison(&self, _v1: i64, _v2: i64) -> impl Future<Output = Reply> + Send {
        let reply = self.0.clone();
        async move { reply }
    }
}

fn payload(v1: i64, v2: i64) -> Value {
    json!({
        "comparison": {
            "v1": {"id": v1, "name": format!("Release {v1}")},
            "v2": {"id": v2, "name": format!("Release {v2}")},
            "stats_v1": {"visits": 100, "bounce": 50, "duration": 30},
            "stats_v2": {"visits": 120, "bounce": 40, "duration": 45},
            "issues_diff": [
                {"id": 1, "issue_type": "RAGE_CLICK", "location_url": "/login", "status": "worse", "impact_diff": 5}
            ]
        }
    })
}

fn applied_v2(outcome: &CompareOutcome) -> Option<i64> {
    match outcome {
        CompareOutcome::Applied(view) => view.v2.as_ref().map(|v| v.id),
        _ => None,
    }
}

async fn run_two_requests(resolve_newest_first: bool) -> (CompareOutcome, CompareOutcome, Option<i64>) {
    let session = Arc::new(ComparisonSession::new(ComparisonThresholds::default()));
    let (source, mut started) = GatedSource::new();
    let source = Arc::new(source);
    let older_tx = source.expect(1, 2);
    let newer_tx = source.expect(1, 3);

    let older = tokio::spawn({
        let (session, source) = (Arc::clone(&session), Arc::clone(&source));
        async move { session.compare(source.as_ref(), 1, 2).await }
    });
    assert_eq!(started.recv().await, Some((1, 2)));

    let newer = tokio::spawn({
        let (session, source) = (Arc::clone(&session), Arc::clone(&source));
        async move { session.compare(source.as_ref(), 1, 3).await }
    });
    assert_eq!(started.recv().await, Some((1, 3)));

    let (older_outcome, newer_outcome) = if resolve_newest_first {
        newer_tx.send(Ok(payload(1, 3))).expect("send newer");
        let newer_outcome = newer.await.expect("newer task");
        older_tx.send(Ok(payload(1, 2))).expect("send older");
        (older.await.expect("older task"), newer_outcome)
    } else {
        older_tx.send(Ok(payload(1, 2))).expect("send older");
        let older_outcome = older.await.expect("older task");
        newer_tx.send(Ok(payload(1, 3))).expect("send newer");
        (older_outcome, newer.await.expect("newer task"))
    };

    let shown = session
        .snapshot()
        .expect("snapshot")
        .view
        .and_then(|view| view.v2.as_ref().map(|v| v.id));
    (older_outcome, newer_outcome, shown)
}

#[tokio::test]
async fn only_the_newest_comparison_is_displayed_when_it_lands_first() {
    let (older, newer, shown) = run_two_requests(true).await;
    assert!(matches!(older, CompareOutcome::Superseded));
    assert_eq!(applied_v2(&newer), Some(3));
    assert_eq!(shown, Some(3));
}

#[tokio::test]
async fn only_the_newest_comparison_is_displayed_when_it_lands_last() {
    let (older, newer, shown) = run_two_requests(false).await;
    assert!(matches!(older, CompareOutcome::Superseded));
    assert_eq!(applied_v2(&newer), Some(3));
    assert_eq!(shown, Some(3));
}

#[tokio::test]
async fn applied_comparison_replaces_state_atomically() {
    let session = ComparisonSession::new(ComparisonThresholds::default());
    let outcome = session.compare(&FixedSource(Ok(payload(4, 5))), 4, 5).await;

    let CompareOutcome::Applied(view) = outcome else {
        panic!("expected applied outcome");
    };
    assert_eq!(view.headline.visits_diff, 20);
    assert_eq!(view.issues[0].status, IssueStatus::Worse);

    let state = session.snapshot().expect("snapshot");
    assert_eq!(state.pair, Some(VersionPair { v1: 4, v2: 5 }));
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn failure_clears_the_view_and_next_request_clears_the_error() {
    let session = ComparisonSession::new(ComparisonThresholds::default());
    session.compare(&FixedSource(Ok(payload(1, 2))), 1, 2).await;

    let failed = session
        .compare(&FixedSource(Err("API Error 500: boom".to_string())), 1, 3)
        .await;
    assert!(matches!(failed, CompareOutcome::Failed(ref msg) if msg == "API Error 500: boom"));

    let state = session.snapshot().expect("snapshot");
    assert!(state.view.is_none());
    assert_eq!(state.error.as_deref(), Some("API Error 500: boom"));

    session.compare(&FixedSource(Ok(payload(1, 2))), 1, 2).await;
    let state = session.snapshot().expect("snapshot");
    assert!(state.view.is_some());
    assert!(state.error.is_none());
}

struct CountingVersions {
    calls: AtomicUsize,
    fail: bool,
}

impl VersionSource for CountingVersions {
    fn fetch_versions(&self) -> impl Future<Output = Result<Vec<Version>, String>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail;
        async move {
            if fail {
                return Err("API Error 503: unavailable".to_string());
            }
            Ok(vec![
                Version { id: 1, name: "Spring".to_string() },
                Version { id: 2, name: "Summer".to_string() },
                Version { id: 3, name: "Autumn".to_string() },
            ])
        }
    }
}

#[tokio::test]
async fn versions_are_fetched_once_until_teardown() {
    let provider = VersionsProvider::new(CountingVersions {
        calls: AtomicUsize::new(0),
        fail: false,
    });

    let (first, second) = tokio::join!(provider.initialize(), provider.initialize());
    assert_eq!(first, second);
    assert_eq!(first.versions.len(), 3);
    assert!(first.initialized);

    assert_eq!(provider.default_pair().await, Some(VersionPair { v1: 1, v2: 3 }));
    assert_eq!(provider.display_name(2).await, "Summer");
    assert_eq!(provider.display_name(42).await, "v42");
    assert_eq!(provider.latest().await.map(|v| v.id), Some(3));

    provider.teardown().await;
    assert!(provider.versions().await.is_empty());
    provider.initialize().await;

    let state = provider.state().await;
    assert_eq!(state.versions.len(), 3);
}

#[tokio::test]
async fn failed_version_load_is_retried() {
    let source = CountingVersions {
        calls: AtomicUsize::new(0),
        fail: true,
    };
    let provider = VersionsProvider::new(source);

    let state = provider.initialize().await;
    assert_eq!(state.error.as_deref(), Some("API Error 503: unavailable"));
    assert!(!state.initialized);
    assert!(!state.loading);

    provider.initialize().await;
    assert_eq!(provider.default_pair().await, None);
}

#[test]
fn settings_commands_round_trip_and_merge_partial_updates() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config_dir = temp_dir.path().to_string_lossy().to_string();

    let initial = get_settings(&config_dir).expect("load settings");
    assert_eq!(initial["apiBaseUrl"], json!("http://localhost:8000/api"));
    assert!(Path::new(&config_dir).join(".uxlens").join("settings.json").exists());

    let saved = save_settings(
        &config_dir,
        json!({
            "apiBaseUrl": "https://analytics.example.com/api/",
            "topN": 5
        }),
    )
    .expect("save settings");
    assert_eq!(saved["topN"], json!(5));
    assert_eq!(saved["pageMinViews"], json!(20));

    let effective = load_effective_settings(&config_dir).expect("effective settings");
    assert_eq!(effective.api_base_url, "https://analytics.example.com/api");
    assert_eq!(effective.thresholds.top_n, 5);
    assert_eq!(effective.thresholds.issue_noise_floor, 1.0);
}

#[test]
fn corrupt_settings_file_falls_back_to_defaults() {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let config_dir = temp_dir.path().to_string_lossy().to_string();
    let dir = temp_dir.path().join(".uxlens");
    std::fs::create_dir_all(&dir).expect("create settings dir");
    std::fs::write(dir.join("settings.json"), "{ not json").expect("write corrupt settings");

    let effective = load_effective_settings(&config_dir).expect("effective settings");
    assert_eq!(effective.thresholds, ComparisonThresholds::default());
}
