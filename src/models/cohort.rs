use crate::models::diff::DiffStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CohortRecord {
    pub name: String,
    /// Share of sessions, 0–100
    pub percentage: f64,
    pub avg_bounce_rate: f64,
    pub avg_duration: f64,
    pub users_count: u64,
    pub metrics: Value,
    pub conversion_rates: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortStatus {
    New,
    Removed,
    Changed,
    Stable,
}

impl CohortStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Some(CohortStatus::New),
            "removed" => Some(CohortStatus::Removed),
            "changed" => Some(CohortStatus::Changed),
            "stable" => Some(CohortStatus::Stable),
            _ => None,
        }
    }
}

impl From<DiffStatus> for CohortStatus {
    fn from(status: DiffStatus) -> Self {
        match status {
            DiffStatus::New => CohortStatus::New,
            DiffStatus::Removed | DiffStatus::Resolved => CohortStatus::Removed,
            DiffStatus::Stable => CohortStatus::Stable,
            DiffStatus::Improved | DiffStatus::Worse | DiffStatus::Changed => CohortStatus::Changed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortDiffRow {
    pub name: String,
    pub status: CohortStatus,
    /// Share delta in percentage points, when the cohort exists in both versions
    pub share_diff: Option<f64>,
    pub v1: Option<CohortRecord>,
    pub v2: Option<CohortRecord>,
}
