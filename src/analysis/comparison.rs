use crate::analysis::alerts::build_alerts;
use crate::analysis::cohorts::diff_cohorts;
use crate::analysis::diff::top_n_by;
use crate::analysis::headline::compute_headline_deltas;
use crate::analysis::issues::{compare_issue_rows, diff_issues};
use crate::analysis::normalize;
use crate::analysis::pages::{compare_page_rows, diff_pages};
use crate::analysis::split::build_split_comparison;
use crate::models::cohort::CohortDiffRow;
use crate::models::comparison::{ComparisonThresholds, ComparisonView, LocalComparison, VersionEntities};
use crate::models::snapshot::HeadlineDeltas;
use crate::models::split::{SplitKind, SplitRow};
use serde_json::Value;
use std::cmp::Ordering;

/// Normalize a `/compare/` payload (bare or wrapped in `{comparison: ...}`)
/// into the view bundle. Rows are re-sorted and truncated locally so the
/// ordering does not depend on the server.
pub fn build_comparison_view(payload: &Value, thresholds: &ComparisonThresholds) -> ComparisonView {
    let body = normalize::unwrap_envelope(payload, "comparison");

    let stats_v1 = normalize::snapshot(body.get("stats_v1"));
    let stats_v2 = normalize::snapshot(body.get("stats_v2"));
    let headline = if body.get("stats_v1").is_some() || body.get("stats_v2").is_some() {
        compute_headline_deltas(&stats_v1, &stats_v2)
    } else {
        HeadlineDeltas {
            visits_diff: normalize::i64_field(body, &["visits_diff"]).unwrap_or(0),
            bounce_diff: normalize::f64_field(body, &["bounce_diff"]),
            duration_diff: normalize::f64_field(body, &["duration_diff"]),
        }
    };

    let issues: Vec<_> = normalize::array(body, "issues_diff")
        .iter()
        .filter_map(normalize::issue_row)
        .collect();
    let pages: Vec<_> = normalize::array(body, "pages_diff")
        .iter()
        .filter_map(normalize::page_row)
        .collect();

    let alerts = match body.get("alerts").and_then(Value::as_array) {
        Some(raw) => raw.iter().filter_map(normalize::alert).collect(),
        None => build_alerts(&issues, &pages, &thresholds.alerts),
    };

    let cohorts_v1 = normalize::cohorts(body.get("v1_cohorts").unwrap_or(&Value::Null));
    let cohorts_v2 = normalize::cohorts(body.get("v2_cohorts").unwrap_or(&Value::Null));
    let cohorts: Vec<CohortDiffRow> = if cohorts_v1.is_empty() && cohorts_v2.is_empty() {
        normalize::array(body, "cohorts_diff")
            .iter()
            .filter_map(normalize::cohort_row)
            .collect()
    } else {
        diff_cohorts(&cohorts_v1, &cohorts_v2)
    };

    let view = ComparisonView {
        v1: body.get("v1").and_then(normalize::version),
        v2: body.get("v2").and_then(normalize::version),
        stats_v1,
        stats_v2,
        headline,
        device_split: split_rows(body, SplitKind::Device),
        browser_split: split_rows(body, SplitKind::Browser),
        os_split: split_rows(body, SplitKind::Os),
        issues: top_n_by(issues, thresholds.top_n, compare_issue_rows),
        pages: top_n_by(pages, thresholds.top_n, compare_page_rows),
        cohorts: top_n_by(cohorts, thresholds.top_n, compare_cohort_rows),
        alerts,
        ai_analysis: normalize::str_field(body, &["ai_analysis"]),
        computed_at: chrono::Utc::now().timestamp(),
    };
    log::debug!(
        "comparison view built: {} issues, {} pages, {} cohorts, {} alerts",
        view.issues.len(),
        view.pages.len(),
        view.cohorts.len(),
        view.alerts.len()
    );
    view
}

fn split_rows(body: &Value, kind: SplitKind) -> Vec<SplitRow> {
    let (side_a, side_b) = normalize::split_sides(normalize::array(body, kind.payload_field()), kind);
    build_split_comparison(&side_a, &side_b, |share| kind.category_key(&share.label))
}

/// Diff per-version entity lists on the client, for when only the raw lists are available.
pub fn build_local_comparison(
    entities_a: &VersionEntities,
    entities_b: &VersionEntities,
    thresholds: &ComparisonThresholds,
) -> LocalComparison {
    let issues = diff_issues(&entities_a.issues, &entities_b.issues, thresholds.issue_noise_floor);
    let pages = diff_pages(&entities_a.pages, &entities_b.pages, &thresholds.pages);
    let alerts = build_alerts(&issues, &pages, &thresholds.alerts);
    let cohorts = diff_cohorts(&entities_a.cohorts, &entities_b.cohorts);

    LocalComparison {
        issues: top_n_by(issues, thresholds.top_n, compare_issue_rows),
        pages: top_n_by(pages, thresholds.top_n, compare_page_rows),
        cohorts: top_n_by(cohorts, thresholds.top_n, compare_cohort_rows),
        alerts,
    }
}

/// Largest share swing first; new and removed cohorts weigh by their present share.
fn compare_cohort_rows(x: &CohortDiffRow, y: &CohortDiffRow) -> Ordering {
    cohort_magnitude(y)
        .total_cmp(&cohort_magnitude(x))
        .then_with(|| x.name.cmp(&y.name))
}

fn cohort_magnitude(row: &CohortDiffRow) -> f64 {
    row.share_diff
        .or_else(|| row.v2.as_ref().or(row.v1.as_ref()).map(|c| c.percentage))
        .map(f64::abs)
        .unwrap_or(0.0)
}
