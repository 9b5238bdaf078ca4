use crate::analysis::diff::{classify_change, outer_join};
use crate::analysis::format::round_to;
use crate::analysis::urls::{normalize_url, readable_page_name};
use crate::models::diff::{DiffPolicy, DiffStatus, MetricKind, NoiseFloor};
use crate::models::page::{PageDiffOptions, PageDiffRow, PageMetrics, PageStatus};
use std::cmp::Ordering;

/// Diff per-page metrics of two versions. Exit-rate and time-on-page changes
/// are reported as signed deltas; a page is `changed` once either moves past
/// the change threshold.
pub fn diff_pages(pages_a: &[PageMetrics], pages_b: &[PageMetrics], options: &PageDiffOptions) -> Vec<PageDiffRow> {
    let exit_policy = DiffPolicy::neutral(MetricKind::Percentage)
        .with_noise_floor(NoiseFloor::Absolute(options.change_threshold));
    let time_policy = DiffPolicy::neutral(MetricKind::Duration)
        .with_noise_floor(NoiseFloor::Absolute(options.change_threshold));

    let mut rows: Vec<PageDiffRow> = outer_join(pages_a, pages_b, |m| normalize_url(&m.url))
        .into_iter()
        .filter_map(|(key, (m1, m2))| {
            let max_views = m1
                .map(|m| m.total_views)
                .unwrap_or(0)
                .max(m2.map(|m| m.total_views).unwrap_or(0));
            if max_views > 0 && max_views < options.min_views {
                return None;
            }

            let (status, exit_diff, time_diff) = match (m1, m2) {
                (Some(_), None) => (PageStatus::Removed, 0.0, 0.0),
                (None, Some(_)) => (PageStatus::New, 0.0, 0.0),
                (Some(a), Some(b)) => {
                    let exit_diff = b.exit_rate - a.exit_rate;
                    let time_diff = (b.avg_time_on_page - a.avg_time_on_page)
                        .clamp(-options.time_clamp, options.time_clamp);
                    let exit_status = classify_change(a.exit_rate, b.exit_rate, &exit_policy);
                    let time_status = classify_change(0.0, time_diff, &time_policy);
                    let status = if exit_status == DiffStatus::Stable && time_status == DiffStatus::Stable {
                        PageStatus::Stable
                    } else {
                        PageStatus::Changed
                    };
                    (status, exit_diff, time_diff)
                }
                (None, None) => return None,
            };

            let readable = readable_page_name(&m2.or(m1)?.url);
            Some(PageDiffRow {
                key,
                status,
                exit_diff: round_to(exit_diff, 1),
                time_diff: round_to(time_diff, 1),
                readable,
                v1: m1.cloned(),
                v2: m2.cloned(),
            })
        })
        .collect();

    sort_page_rows(&mut rows);
    rows
}

/// Largest exit-rate swing first, then by readable name.
pub fn compare_page_rows(x: &PageDiffRow, y: &PageDiffRow) -> Ordering {
    y.exit_diff
        .abs()
        .total_cmp(&x.exit_diff.abs())
        .then_with(|| x.readable.cmp(&y.readable))
        .then_with(|| x.key.cmp(&y.key))
}

pub fn sort_page_rows(rows: &mut [PageDiffRow]) {
    rows.sort_by(compare_page_rows);
}
