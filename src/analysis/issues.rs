use crate::analysis::diff::{diff_record, outer_join};
use crate::analysis::format::round_to;
use crate::analysis::urls::{normalize_url, readable_page_name};
use crate::models::diff::{DiffPolicy, MetricKind, NoiseFloor};
use crate::models::issue::{IssueDiffRow, IssueRecord, IssueStatus};
use std::cmp::Ordering;

/// Issues match across versions by type and normalized location.
pub fn issue_key(issue: &IssueRecord) -> (String, String) {
    (issue.issue_type.clone(), normalize_url(&issue.location_url))
}

/// Higher impact is worse; issues missing from B are resolved.
pub fn issue_policy(noise_floor: f64) -> DiffPolicy {
    DiffPolicy::lower_is_better(MetricKind::Score)
        .with_noise_floor(NoiseFloor::Absolute(noise_floor))
        .resolving()
}

/// Diff the issue lists of two versions, sorted for display.
pub fn diff_issues(issues_a: &[IssueRecord], issues_b: &[IssueRecord], noise_floor: f64) -> Vec<IssueDiffRow> {
    let policy = issue_policy(noise_floor);

    let mut rows: Vec<IssueDiffRow> = outer_join(issues_a, issues_b, issue_key)
        .into_values()
        .filter_map(|(previous, current)| {
            let record = diff_record(
                (),
                previous.map(|i| i.impact_score),
                current.map(|i| i.impact_score),
                &policy,
            );
            let issue = current.or(previous)?;
            Some(IssueDiffRow {
                issue: issue.clone(),
                status: IssueStatus::from(record.status),
                impact_diff: round_to(record.signed_shift(), 2),
                location_readable: readable_page_name(&issue.location_url),
            })
        })
        .collect();

    sort_issue_rows(&mut rows);
    rows
}

/// Largest impact shift first, then by severity, then by type and location.
pub fn compare_issue_rows(x: &IssueDiffRow, y: &IssueDiffRow) -> Ordering {
    y.impact_diff
        .abs()
        .total_cmp(&x.impact_diff.abs())
        .then_with(|| {
            x.issue
                .effective_severity()
                .rank()
                .cmp(&y.issue.effective_severity().rank())
        })
        .then_with(|| x.issue.issue_type.cmp(&y.issue.issue_type))
        .then_with(|| x.issue.location_url.cmp(&y.issue.location_url))
        .then_with(|| x.issue.id.cmp(&y.issue.id))
}

pub fn sort_issue_rows(rows: &mut [IssueDiffRow]) {
    rows.sort_by(compare_issue_rows);
}

/// Client-side priority filter; `None` or `all` keeps every issue.
pub fn filter_by_priority(issues: &[IssueRecord], priority: Option<&str>) -> Vec<IssueRecord> {
    let wanted = match priority.map(str::trim) {
        None => return issues.to_vec(),
        Some(p) if p.is_empty() || p.eq_ignore_ascii_case("all") => return issues.to_vec(),
        Some(p) => p.to_ascii_uppercase(),
    };

    issues
        .iter()
        .filter(|issue| {
            issue
                .priority
                .as_deref()
                .map(|p| p.trim().to_ascii_uppercase() == wanted)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}
