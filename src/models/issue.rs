use crate::models::diff::DiffStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "WARNING" => Some(Severity::Warning),
            "INFO" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Lower rank sorts first.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::Warning => 1,
            Severity::Info => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
}

impl Priority {
    /// Accepts `P0`/`p0`/`0` style values.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "P0" | "0" => Some(Priority::P0),
            "P1" | "1" => Some(Priority::P1),
            "P2" | "2" => Some(Priority::P2),
            _ => None,
        }
    }

    pub fn implied_severity(self) -> Severity {
        match self {
            Priority::P0 => Severity::Critical,
            Priority::P1 => Severity::Warning,
            Priority::P2 => Severity::Info,
        }
    }
}

/// A detected UX issue as served by the backend for one version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: i64,
    pub issue_type: String,
    pub severity: Option<Severity>,
    pub priority: Option<String>,
    pub location_url: String,
    pub impact_score: f64,
    pub affected_sessions: u64,
    pub description: Option<String>,
    pub recommended_specialists: Vec<String>,
    pub detected_version_name: Option<String>,
}

impl IssueRecord {
    /// Explicit severity wins; otherwise the one implied by priority; otherwise INFO.
    pub fn effective_severity(&self) -> Severity {
        self.severity
            .or_else(|| {
                self.priority
                    .as_deref()
                    .and_then(Priority::parse)
                    .map(Priority::implied_severity)
            })
            .unwrap_or(Severity::Info)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    New,
    Worse,
    Improved,
    Stable,
    Resolved,
}

impl IssueStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" => Some(IssueStatus::New),
            "worse" => Some(IssueStatus::Worse),
            "improved" => Some(IssueStatus::Improved),
            "stable" => Some(IssueStatus::Stable),
            "resolved" | "removed" => Some(IssueStatus::Resolved),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IssueStatus::New => "New",
            IssueStatus::Worse => "Worse",
            IssueStatus::Improved => "Improved",
            IssueStatus::Stable => "Stable",
            IssueStatus::Resolved => "Resolved",
        }
    }
}

impl From<DiffStatus> for IssueStatus {
    fn from(status: DiffStatus) -> Self {
        match status {
            DiffStatus::New => IssueStatus::New,
            DiffStatus::Removed | DiffStatus::Resolved => IssueStatus::Resolved,
            DiffStatus::Stable => IssueStatus::Stable,
            DiffStatus::Improved => IssueStatus::Improved,
            // Issues are diffed with a directional policy; an undirected change still counts against the build.
            DiffStatus::Worse | DiffStatus::Changed => IssueStatus::Worse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDiffRow {
    pub issue: IssueRecord,
    pub status: IssueStatus,
    /// Impact delta; +impact for new issues, −impact for resolved ones
    pub impact_diff: f64,
    pub location_readable: String,
}
