use crate::models::alert::{AlertKind, AlertLevel, AlertRecord, AlertThresholds};
use crate::models::issue::{IssueDiffRow, IssueStatus, Severity};
use crate::models::page::{PageDiffRow, PageStatus};

/// Alerts for a comparison: newly appeared critical issues, then pages whose
/// exit rate grew past the alert threshold.
pub fn build_alerts(issues: &[IssueDiffRow], pages: &[PageDiffRow], thresholds: &AlertThresholds) -> Vec<AlertRecord> {
    let mut alerts = Vec::new();

    for row in issues {
        if row.status == IssueStatus::New && row.issue.effective_severity() == Severity::Critical {
            let message = row
                .issue
                .description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| format!("New critical {} on {}", row.issue.issue_type, row.location_readable));
            alerts.push(AlertRecord {
                kind: AlertKind::NewCritical,
                message,
                url: row.issue.location_url.clone(),
                issue_id: Some(row.issue.id),
                severity: AlertLevel::Critical,
            });
        }
    }

    for row in pages {
        if row.status == PageStatus::Changed && row.exit_diff > thresholds.exit_increase {
            let severity = if row.exit_diff < thresholds.exit_increase_critical {
                AlertLevel::Warning
            } else {
                AlertLevel::Critical
            };
            alerts.push(AlertRecord {
                kind: AlertKind::ExitIncrease,
                message: format!("Exit rate up {:.1} pp on {}", row.exit_diff, row.readable),
                url: row.url().to_string(),
                issue_id: None,
                severity,
            });
        }
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::issue::IssueRecord;
    use crate::models::page::PageMetrics;

    fn issue_row(id: i64, status: IssueStatus, severity: Option<Severity>, priority: Option<&str>) -> IssueDiffRow {
        IssueDiffRow {
            issue: IssueRecord {
                id,
                issue_type: "RAGE_CLICK".to_string(),
                severity,
                priority: priority.map(str::to_string),
                location_url: "https://x.io/login".to_string(),
                impact_score: 50.0,
                affected_sessions: 120,
                description: None,
                recommended_specialists: Vec::new(),
                detected_version_name: None,
            },
            status,
            impact_diff: 50.0,
            location_readable: "Authorization".to_string(),
        }
    }

    fn page_row(status: PageStatus, exit_diff: f64) -> PageDiffRow {
        PageDiffRow {
            key: "https://x.io/loan/form".to_string(),
            status,
            exit_diff,
            time_diff: 0.0,
            readable: "Loan Details Form".to_string(),
            v1: None,
            v2: Some(PageMetrics {
                url: "https://x.io/loan/form".to_string(),
                ..PageMetrics::default()
            }),
        }
    }

    #[test]
    fn raises_only_for_new_critical_issues() {
        let rows = vec![
            issue_row(1, IssueStatus::New, Some(Severity::Critical), None),
            issue_row(2, IssueStatus::Worse, Some(Severity::Critical), None),
            issue_row(3, IssueStatus::New, Some(Severity::Warning), None),
            issue_row(4, IssueStatus::New, None, Some("P0")),
        ];
        let alerts = build_alerts(&rows, &[], &AlertThresholds::default());
        let ids: Vec<Option<i64>> = alerts.iter().map(|a| a.issue_id).collect();
        assert_eq!(ids, vec![Some(1), Some(4)]);
        assert!(alerts.iter().all(|a| a.severity == AlertLevel::Critical));
        assert_eq!(alerts[0].message, "New critical RAGE_CLICK on Authorization");
    }

    #[test]
    fn grades_exit_increases_by_size() {
        let pages = vec![
            page_row(PageStatus::Changed, 10.0),
            page_row(PageStatus::Changed, 12.5),
            page_row(PageStatus::Changed, 20.0),
            page_row(PageStatus::New, 50.0),
        ];
        let alerts = build_alerts(&[], &pages, &AlertThresholds::default());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, AlertLevel::Warning);
        assert_eq!(alerts[0].message, "Exit rate up 12.5 pp on Loan Details Form");
        assert_eq!(alerts[1].severity, AlertLevel::Critical);
        assert_eq!(alerts[1].url, "https://x.io/loan/form");
    }
}
