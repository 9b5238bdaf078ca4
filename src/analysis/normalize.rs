use crate::analysis::format::round_to;
use crate::analysis::urls::{normalize_url, readable_page_name};
use crate::models::alert::{AlertKind, AlertLevel, AlertRecord};
use crate::models::cohort::{CohortDiffRow, CohortRecord, CohortStatus};
use crate::models::issue::{IssueDiffRow, IssueRecord, IssueStatus, Severity};
use crate::models::page::{PageDiffRow, PageMetrics, PageStatus};
use crate::models::snapshot::MetricSnapshot;
use crate::models::split::{SplitKind, SplitShare};
use crate::models::version::Version;
use serde_json::Value;

/// Numeric value of a JSON field, accepting numbers sent as strings. Every
/// field helper below falls back to a safe default instead of failing.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// First numeric field among `keys`, else 0.
pub fn f64_field(obj: &Value, keys: &[&str]) -> f64 {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(number))
        .unwrap_or(0.0)
}

pub fn u64_field(obj: &Value, keys: &[&str]) -> u64 {
    f64_field(obj, keys).max(0.0).round() as u64
}

pub fn i64_field(obj: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(number))
        .map(|n| n.round() as i64)
}

/// First non-blank string among `keys`; numbers are accepted as their text.
pub fn str_field(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn array<'a>(obj: &'a Value, key: &str) -> &'a [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// `{key: {...}}` unwraps to the inner object; anything else is returned as-is.
pub fn unwrap_envelope<'a>(payload: &'a Value, key: &str) -> &'a Value {
    match payload.get(key) {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    }
}

/// A bare array, or the first array found under one of `keys`.
pub fn list_payload<'a>(value: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(items) = value.as_array() {
        return items;
    }
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn snapshot(value: Option<&Value>) -> MetricSnapshot {
    let Some(obj) = value.filter(|v| v.is_object()) else {
        return MetricSnapshot::default();
    };
    MetricSnapshot {
        visits: u64_field(obj, &["visits"]).min(i64::MAX as u64),
        bounce_rate: f64_field(obj, &["bounce", "bounce_rate"]).clamp(0.0, 100.0),
        avg_duration: f64_field(obj, &["duration", "avg_duration"]).max(0.0),
    }
}

pub fn version(value: &Value) -> Option<Version> {
    let id = i64_field(value, &["id"])?;
    let name = str_field(value, &["name"]).unwrap_or_else(|| format!("v{id}"));
    Some(Version { id, name })
}

pub fn versions(payload: &Value) -> Vec<Version> {
    list_payload(payload, &["versions", "results"])
        .iter()
        .filter_map(version)
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn issue(value: &Value) -> Option<IssueRecord> {
    if !value.is_object() {
        return None;
    }
    Some(IssueRecord {
        id: i64_field(value, &["id", "issue_id"]).unwrap_or(0),
        issue_type: str_field(value, &["issue_type", "type"]).unwrap_or_else(|| "UNKNOWN".to_string()),
        severity: str_field(value, &["severity"]).as_deref().and_then(Severity::parse),
        priority: str_field(value, &["priority"]),
        location_url: str_field(value, &["location_url", "url"]).unwrap_or_default(),
        impact_score: f64_field(value, &["impact_score", "impact"]),
        affected_sessions: u64_field(value, &["affected_sessions"]),
        description: str_field(value, &["description"]),
        recommended_specialists: string_list(value.get("recommended_specialists")),
        detected_version_name: str_field(value, &["detected_version_name", "version_name"]),
    })
}

pub fn issues(payload: &Value) -> Vec<IssueRecord> {
    list_payload(payload, &["results", "issues"])
        .iter()
        .filter_map(issue)
        .collect()
}

pub fn page(value: &Value) -> Option<PageMetrics> {
    if !value.is_object() {
        return None;
    }
    Some(PageMetrics {
        url: str_field(value, &["url", "page_url"]).unwrap_or_default(),
        page_title: str_field(value, &["page_title", "title"]),
        exit_rate: f64_field(value, &["exit_rate"]).clamp(0.0, 100.0),
        avg_time_on_page: f64_field(value, &["avg_time_on_page"]).max(0.0),
        avg_scroll_depth: f64_field(value, &["avg_scroll_depth"]).max(0.0),
        total_views: u64_field(value, &["total_views", "views"]),
        unique_visitors: u64_field(value, &["unique_visitors"]),
        dominant_cohort: str_field(value, &["dominant_cohort"]),
        dominant_device: str_field(value, &["dominant_device"]),
    })
}

pub fn pages(payload: &Value) -> Vec<PageMetrics> {
    list_payload(payload, &["results", "pages"])
        .iter()
        .filter_map(page)
        .collect()
}

pub fn cohort(value: &Value) -> Option<CohortRecord> {
    if !value.is_object() {
        return None;
    }
    Some(CohortRecord {
        name: str_field(value, &["name"]).unwrap_or_else(|| "Unknown".to_string()),
        percentage: f64_field(value, &["percentage", "display_percentage"]).max(0.0),
        avg_bounce_rate: f64_field(value, &["avg_bounce_rate"]),
        avg_duration: f64_field(value, &["avg_duration"]),
        users_count: u64_field(value, &["users_count"]),
        metrics: value.get("metrics").cloned().unwrap_or(Value::Null),
        conversion_rates: value.get("conversion_rates").cloned().unwrap_or(Value::Null),
    })
}

pub fn cohorts(payload: &Value) -> Vec<CohortRecord> {
    list_payload(payload, &["results", "cohorts"])
        .iter()
        .filter_map(cohort)
        .collect()
}

/// Issue rows arrive flat (issue fields next to `status`) or with a nested `issue` object.
pub fn issue_row(value: &Value) -> Option<IssueDiffRow> {
    let record = match value.get("issue") {
        Some(inner) if inner.is_object() => issue(inner)?,
        _ => issue(value)?,
    };
    let status = str_field(value, &["status"])
        .as_deref()
        .and_then(IssueStatus::parse)
        .unwrap_or(IssueStatus::Stable);
    let location_readable = str_field(value, &["location_readable"])
        .unwrap_or_else(|| readable_page_name(&record.location_url));

    Some(IssueDiffRow {
        status,
        impact_diff: f64_field(value, &["impact_diff"]),
        location_readable,
        issue: record,
    })
}

pub fn page_row(value: &Value) -> Option<PageDiffRow> {
    if !value.is_object() {
        return None;
    }
    let v1 = value.get("v1").and_then(page);
    let v2 = value.get("v2").and_then(page);
    let url = v2
        .as_ref()
        .or(v1.as_ref())
        .map(|m| m.url.clone())
        .or_else(|| str_field(value, &["url"]))?;

    Some(PageDiffRow {
        key: str_field(value, &["key"]).unwrap_or_else(|| normalize_url(&url)),
        status: str_field(value, &["status"])
            .as_deref()
            .and_then(PageStatus::parse)
            .unwrap_or(PageStatus::Stable),
        exit_diff: f64_field(value, &["exit_diff"]),
        time_diff: f64_field(value, &["time_diff"]),
        readable: str_field(value, &["readable"]).unwrap_or_else(|| readable_page_name(&url)),
        v1,
        v2,
    })
}

pub fn cohort_row(value: &Value) -> Option<CohortDiffRow> {
    if !value.is_object() {
        return None;
    }
    let v1 = value.get("v1").and_then(cohort);
    let v2 = value.get("v2").and_then(cohort);
    let name = str_field(value, &["name"])
        .or_else(|| v2.as_ref().or(v1.as_ref()).map(|c| c.name.clone()))?;
    let share_diff = match (&v1, &v2) {
        (Some(a), Some(b)) => Some(round_to(b.percentage - a.percentage, 1)),
        _ => None,
    };

    Some(CohortDiffRow {
        name,
        status: str_field(value, &["status"])
            .as_deref()
            .and_then(CohortStatus::parse)
            .unwrap_or(CohortStatus::Stable),
        share_diff,
        v1,
        v2,
    })
}

/// Alerts of an unknown kind are dropped.
pub fn alert(value: &Value) -> Option<AlertRecord> {
    let kind = str_field(value, &["type", "kind"])
        .as_deref()
        .and_then(AlertKind::parse)?;
    let severity = match str_field(value, &["severity"]) {
        Some(s) if s.eq_ignore_ascii_case("critical") => AlertLevel::Critical,
        _ => AlertLevel::Warning,
    };
    Some(AlertRecord {
        kind,
        message: str_field(value, &["message"]).unwrap_or_default(),
        url: str_field(value, &["url"]).unwrap_or_default(),
        issue_id: i64_field(value, &["issue_id"]),
        severity,
    })
}

/// Splits joined split rows back into per-version shares. A category whose
/// side carries no visits and no share is treated as absent on that side.
pub fn split_sides(rows: &[Value], kind: SplitKind) -> (Vec<SplitShare>, Vec<SplitShare>) {
    let mut side_a = Vec::new();
    let mut side_b = Vec::new();

    for row in rows.iter().filter(|r| r.is_object()) {
        let label = str_field(row, &[kind.label_field(), "label"]).unwrap_or_default();
        let a = side(row, &label, "v1");
        let b = side(row, &label, "v2");
        let a_present = a.visits > 0 || a.share.is_some_and(|s| s > 0.0);
        let b_present = b.visits > 0 || b.share.is_some_and(|s| s > 0.0);

        if a_present || !b_present {
            side_a.push(a);
        }
        if b_present {
            side_b.push(b);
        }
    }

    (side_a, side_b)
}

fn side(row: &Value, label: &str, suffix: &str) -> SplitShare {
    let visits_key = format!("visits_{suffix}");
    let share_key = format!("share_{suffix}");
    let bounce_key = format!("bounce_{suffix}");
    let duration_key = format!("duration_{suffix}");
    SplitShare {
        label: label.to_string(),
        visits: u64_field(row, &[visits_key.as_str()]),
        share: row.get(share_key.as_str()).and_then(number),
        bounce: f64_field(row, &[bounce_key.as_str()]),
        duration: f64_field(row, &[duration_key.as_str()]),
    }
}
