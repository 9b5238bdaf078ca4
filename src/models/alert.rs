use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    NewCritical,
    ExitIncrease,
    CriticalIssue,
    HighExit,
}

impl AlertKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NEW_CRITICAL" => Some(AlertKind::NewCritical),
            "EXIT_INCREASE" => Some(AlertKind::ExitIncrease),
            "CRITICAL_ISSUE" => Some(AlertKind::CriticalIssue),
            "HIGH_EXIT" => Some(AlertKind::HighExit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub url: String,
    pub issue_id: Option<i64>,
    pub severity: AlertLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Exit-rate increase (pp) that raises a warning
    pub exit_increase: f64,
    /// Exit-rate increase (pp) at which the alert becomes critical
    pub exit_increase_critical: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            exit_increase: 10.0,
            exit_increase_critical: 20.0,
        }
    }
}
