use crate::analysis::comparison::build_comparison_view;
use crate::analysis::normalize;
use crate::commands::api::ApiClient;
use crate::models::comparison::{ComparisonThresholds, ComparisonView, VersionEntities};
use crate::models::version::VersionPair;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Anything that can produce a raw `/compare/` payload for a version pair.
pub trait ComparisonSource: Send + Sync {
    fn fetch_comparison(&self, v1: i64, v2: i64) -> impl Future<Output = Result<Value, String>> + Send;
}

impl ComparisonSource for ApiClient {
    fn fetch_comparison(&self, v1: i64, v2: i64) -> impl Future<Output = Result<Value, String>> + Send {
        async move {
            self.get_compare(Some(v1), Some(v2))
                .await
                .map_err(|e| e.to_string())
        }
    }
}

/// What the comparison view currently shows
#[derive(Debug, Clone, Default)]
pub struct ComparisonState {
    pub pair: Option<VersionPair>,
    pub view: Option<Arc<ComparisonView>>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Clone)]
pub enum CompareOutcome {
    Applied(Arc<ComparisonView>),
    /// A newer request was issued while this one was in flight; its result was dropped.
    Superseded,
    Failed(String),
}

/// Latest-wins comparison requests. Every request takes a ticket from a
/// monotonically increasing sequence; a response is applied only while its
/// ticket is still the newest one.
pub struct ComparisonSession {
    sequence: AtomicU64,
    state: Mutex<ComparisonState>,
    thresholds: ComparisonThresholds,
}

impl ComparisonSession {
    pub fn new(thresholds: ComparisonThresholds) -> Self {
        Self {
            sequence: AtomicU64::new(0),
            state: Mutex::new(ComparisonState::default()),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &ComparisonThresholds {
        &self.thresholds
    }

    /// Start a request for `pair`. Clears any previous error and marks the view as loading.
    pub fn begin(&self, pair: VersionPair) -> Result<u64, String> {
        let mut state = self.state.lock().map_err(|_| "Comparison state lock error".to_string())?;
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        state.pair = Some(pair);
        state.loading = true;
        state.error = None;
        Ok(ticket)
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.sequence.load(Ordering::SeqCst) == ticket
    }

    /// Apply a finished request. State is replaced in one step under the lock;
    /// a failure clears the view rather than leaving the previous pair's data on screen.
    pub fn finish(&self, ticket: u64, result: Result<ComparisonView, String>) -> CompareOutcome {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return CompareOutcome::Failed("Comparison state lock error".to_string()),
        };
        if !self.is_current(ticket) {
            log::debug!("dropping superseded comparison #{ticket}");
            return CompareOutcome::Superseded;
        }

        state.loading = false;
        match result {
            Ok(view) => {
                let view = Arc::new(view);
                state.view = Some(Arc::clone(&view));
                state.error = None;
                CompareOutcome::Applied(view)
            }
            Err(message) => {
                log::warn!("comparison #{ticket} failed: {message}");
                state.view = None;
                state.error = Some(message.clone());
                CompareOutcome::Failed(message)
            }
        }
    }

    pub async fn compare<S: ComparisonSource>(&self, source: &S, v1: i64, v2: i64) -> CompareOutcome {
        let ticket = match self.begin(VersionPair { v1, v2 }) {
            Ok(ticket) => ticket,
            Err(e) => return CompareOutcome::Failed(e),
        };

        let fetched = source.fetch_comparison(v1, v2).await;
        if !self.is_current(ticket) {
            log::debug!("comparison #{ticket} superseded before normalization");
            return CompareOutcome::Superseded;
        }

        let result = fetched.map(|payload| build_comparison_view(&payload, &self.thresholds));
        self.finish(ticket, result)
    }

    pub fn snapshot(&self) -> Result<ComparisonState, String> {
        let state = self.state.lock().map_err(|_| "Comparison state lock error".to_string())?;
        Ok(state.clone())
    }
}

/// Per-version issue, page and cohort lists for a local diff.
pub async fn fetch_version_entities(client: &ApiClient, version: i64) -> Result<VersionEntities, String> {
    let version_param = [("version", version.to_string())];
    let (issues, pages, cohorts) = tokio::try_join!(
        client.get_issues(&version_param),
        client.get_pages(&version_param),
        client.get_cohorts(version),
    )
    .map_err(|e| format!("Failed to load version {}: {}", version, e))?;

    Ok(VersionEntities {
        issues: normalize::issues(&issues),
        pages: normalize::pages(&pages),
        cohorts: cohorts.iter().filter_map(normalize::cohort).collect(),
    })
}
