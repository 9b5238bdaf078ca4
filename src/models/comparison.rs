use crate::models::alert::{AlertRecord, AlertThresholds};
use crate::models::cohort::{CohortDiffRow, CohortRecord};
use crate::models::issue::{IssueDiffRow, IssueRecord};
use crate::models::page::{PageDiffOptions, PageDiffRow, PageMetrics};
use crate::models::snapshot::{HeadlineDeltas, MetricSnapshot};
use crate::models::split::SplitRow;
use crate::models::version::Version;
use serde::{Deserialize, Serialize};

/// Everything the comparison view renders for one version pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonView {
    pub v1: Option<Version>,
    pub v2: Option<Version>,
    pub stats_v1: MetricSnapshot,
    pub stats_v2: MetricSnapshot,
    pub headline: HeadlineDeltas,
    pub device_split: Vec<SplitRow>,
    pub browser_split: Vec<SplitRow>,
    pub os_split: Vec<SplitRow>,
    pub issues: Vec<IssueDiffRow>,
    pub pages: Vec<PageDiffRow>,
    pub cohorts: Vec<CohortDiffRow>,
    pub alerts: Vec<AlertRecord>,
    pub ai_analysis: Option<String>,
    pub computed_at: i64,
}

/// Per-version entity lists fetched separately and diffed locally
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VersionEntities {
    pub issues: Vec<IssueRecord>,
    pub pages: Vec<PageMetrics>,
    pub cohorts: Vec<CohortRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalComparison {
    pub issues: Vec<IssueDiffRow>,
    pub pages: Vec<PageDiffRow>,
    pub cohorts: Vec<CohortDiffRow>,
    pub alerts: Vec<AlertRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonThresholds {
    /// Rows kept per table after sorting
    pub top_n: usize,
    /// Impact change at or below which an issue is `stable`
    pub issue_noise_floor: f64,
    pub pages: PageDiffOptions,
    pub alerts: AlertThresholds,
}

impl Default for ComparisonThresholds {
    fn default() -> Self {
        Self {
            top_n: 20,
            issue_noise_floor: 1.0,
            pages: PageDiffOptions::default(),
            alerts: AlertThresholds::default(),
        }
    }
}
