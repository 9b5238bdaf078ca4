use crate::models::diff::DiffStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageMetrics {
    pub url: String,
    pub page_title: Option<String>,
    pub exit_rate: f64,
    pub avg_time_on_page: f64,
    pub avg_scroll_depth: f64,
    pub total_views: u64,
    pub unique_visitors: u64,
    pub dominant_cohort: Option<String>,
    pub dominant_device: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    New,
    Removed,
    Changed,
    Stable,
}

impl PageStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Some(PageStatus::New),
            "removed" => Some(PageStatus::Removed),
            "changed" => Some(PageStatus::Changed),
            "stable" => Some(PageStatus::Stable),
            _ => None,
        }
    }
}

impl From<DiffStatus> for PageStatus {
    fn from(status: DiffStatus) -> Self {
        match status {
            DiffStatus::New => PageStatus::New,
            DiffStatus::Removed | DiffStatus::Resolved => PageStatus::Removed,
            DiffStatus::Stable => PageStatus::Stable,
            DiffStatus::Improved | DiffStatus::Worse | DiffStatus::Changed => PageStatus::Changed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDiffRow {
    /// Normalized URL
    pub key: String,
    pub status: PageStatus,
    /// Exit-rate delta in percentage points
    pub exit_diff: f64,
    /// Time-on-page delta in seconds
    pub time_diff: f64,
    pub readable: String,
    pub v1: Option<PageMetrics>,
    pub v2: Option<PageMetrics>,
}

impl PageDiffRow {
    pub fn url(&self) -> &str {
        self.v2
            .as_ref()
            .or(self.v1.as_ref())
            .map(|m| m.url.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageDiffOptions {
    /// Pages whose busiest side has fewer views are skipped
    pub min_views: u64,
    /// Exit or time delta above which a page is `changed`
    pub change_threshold: f64,
    /// Time deltas are clamped to ±this many seconds
    pub time_clamp: f64,
}

impl Default for PageDiffOptions {
    fn default() -> Self {
        Self {
            min_views: 20,
            change_threshold: 5.0,
            time_clamp: 1800.0,
        }
    }
}
