use crate::commands::api::ApiClient;
use crate::models::version::{Version, VersionPair};
use std::future::Future;
use tokio::sync::Mutex;

/// Where the version list comes from.
pub trait VersionSource: Send + Sync {
    fn fetch_versions(&self) -> impl Future<Output = Result<Vec<Version>, String>> + Send;
}

impl VersionSource for ApiClient {
    fn fetch_versions(&self) -> impl Future<Output = Result<Vec<Version>, String>> + Send {
        async move { self.get_versions().await.map_err(|e| e.to_string()) }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionsState {
    pub versions: Vec<Version>,
    pub loading: bool,
    pub error: Option<String>,
    pub initialized: bool,
}

/// Shared version list. Fetched once by [`VersionsProvider::initialize`] and
/// reused by every view until [`VersionsProvider::teardown`].
pub struct VersionsProvider<S> {
    source: S,
    state: Mutex<VersionsState>,
}

impl<S: VersionSource> VersionsProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: Mutex::new(VersionsState::default()),
        }
    }

    /// Loads the list on first call; later calls return the cached state.
    /// Concurrent callers wait on the same lock, so the source is hit once.
    pub async fn initialize(&self) -> VersionsState {
        let mut state = self.state.lock().await;
        if state.initialized {
            return state.clone();
        }

        state.loading = true;
        match self.source.fetch_versions().await {
            Ok(versions) => {
                log::info!("loaded {} versions", versions.len());
                state.versions = versions;
                state.error = None;
                state.initialized = true;
            }
            Err(e) => {
                log::error!("failed to load versions: {}", e);
                state.versions.clear();
                state.error = Some(e);
            }
        }
        state.loading = false;
        state.clone()
    }

    pub async fn teardown(&self) {
        *self.state.lock().await = VersionsState::default();
    }

    pub async fn state(&self) -> VersionsState {
        self.state.lock().await.clone()
    }

    pub async fn versions(&self) -> Vec<Version> {
        self.state.lock().await.versions.clone()
    }

    /// Name for display; unknown ids render as `v{id}`.
    pub async fn display_name(&self, id: i64) -> String {
        let state = self.state.lock().await;
        display_name(&state.versions, id)
    }

    pub async fn latest(&self) -> Option<Version> {
        self.state.lock().await.versions.last().cloned()
    }

    /// Oldest against newest, when there are at least two versions.
    pub async fn default_pair(&self) -> Option<VersionPair> {
        default_pair(&self.state.lock().await.versions)
    }
}

pub fn display_name(versions: &[Version], id: i64) -> String {
    versions
        .iter()
        .find(|v| v.id == id)
        .map(|v| v.name.clone())
        .unwrap_or_else(|| format!("v{id}"))
}

pub fn default_pair(versions: &[Version]) -> Option<VersionPair> {
    match versions {
        [first, .., last] => Some(VersionPair {
            v1: first.id,
            v2: last.id,
        }),
        _ => None,
    }
}
