use crate::analysis::format::round_to;
use crate::models::split::{SplitRow, SplitShare};
use std::collections::HashMap;

/// `part` as a percentage of `total`; 0 when the total is 0.
pub fn share_of(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    let share = part / total * 100.0;
    if share.is_finite() {
        share
    } else {
        0.0
    }
}

/// Join two category breakdowns on category label. Every category of either
/// side gets a row; the missing side reads as zero. Rows keep first-seen
/// order: A's categories, then the ones only B has.
pub fn build_split_comparison<F>(
    split_a: &[SplitShare],
    split_b: &[SplitShare],
    category_key_of: F,
) -> Vec<SplitRow>
where
    F: Fn(&SplitShare) -> String,
{
    let total_a: f64 = split_a.iter().map(|s| s.visits as f64).sum();
    let total_b: f64 = split_b.iter().map(|s| s.visits as f64).sum();

    let mut order: Vec<String> = Vec::new();
    let mut joined: HashMap<String, (Option<&SplitShare>, Option<&SplitShare>)> = HashMap::new();

    for share in split_a {
        let key = category_key_of(share);
        let slot = joined.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (None, None)
        });
        slot.0 = Some(share);
    }
    for share in split_b {
        let key = category_key_of(share);
        let slot = joined.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (None, None)
        });
        slot.1 = Some(share);
    }

    order
        .into_iter()
        .filter_map(|label| {
            let (a, b) = joined.get(&label).copied()?;
            Some(split_row(label, a, b, total_a, total_b))
        })
        .collect()
}

fn split_row(
    label: String,
    a: Option<&SplitShare>,
    b: Option<&SplitShare>,
    total_a: f64,
    total_b: f64,
) -> SplitRow {
    let share_a = a.map(|s| side_share(s, total_a)).unwrap_or(0.0);
    let share_b = b.map(|s| side_share(s, total_b)).unwrap_or(0.0);
    let bounce_a = a.map(|s| s.bounce).unwrap_or(0.0);
    let bounce_b = b.map(|s| s.bounce).unwrap_or(0.0);
    let duration_a = a.map(|s| s.duration).unwrap_or(0.0);
    let duration_b = b.map(|s| s.duration).unwrap_or(0.0);

    SplitRow {
        label,
        visits_v1: a.map(|s| s.visits).unwrap_or(0),
        visits_v2: b.map(|s| s.visits).unwrap_or(0),
        share_v1: round_to(share_a, 2),
        share_v2: round_to(share_b, 2),
        share_diff: round_to(share_b - share_a, 2),
        bounce_v1: round_to(bounce_a, 1),
        bounce_v2: round_to(bounce_b, 1),
        bounce_diff: round_to(bounce_b - bounce_a, 1),
        duration_v1: round_to(duration_a, 1),
        duration_v2: round_to(duration_b, 1),
        duration_diff: round_to(duration_b - duration_a, 1),
    }
}

fn side_share(share: &SplitShare, side_total: f64) -> f64 {
    share
        .share
        .unwrap_or_else(|| share_of(share.visits as f64, side_total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::split::SplitKind;

    fn by_label(share: &SplitShare) -> String {
        SplitKind::Device.category_key(&share.label)
    }

    fn visits(label: &str, visits: u64, bounce: f64, duration: f64) -> SplitShare {
        SplitShare {
            label: label.to_string(),
            visits,
            share: None,
            bounce,
            duration,
        }
    }

    #[test]
    fn keeps_categories_present_on_one_side_only() {
        let rows = build_split_comparison(&[SplitShare::with_share("mobile", 60.0)], &[], by_label);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "mobile");
        assert_eq!(rows[0].share_v1, 60.0);
        assert_eq!(rows[0].share_v2, 0.0);
        assert_eq!(rows[0].share_diff, -60.0);
    }

    #[test]
    fn shows_full_union_in_first_seen_order() {
        let a = [SplitShare::with_share("desktop", 70.0), SplitShare::with_share("mobile", 30.0)];
        let b = [SplitShare::with_share("tablet", 10.0), SplitShare::with_share("desktop", 90.0)];
        let labels: Vec<String> = build_split_comparison(&a, &b, by_label)
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels, vec!["desktop", "mobile", "tablet"]);
    }

    #[test]
    fn derives_shares_from_visits_and_guards_zero_totals() {
        let a = [visits("desktop", 75, 40.0, 60.0), visits("mobile", 25, 55.0, 30.0)];
        let b = [visits("desktop", 0, 0.0, 0.0)];
        let rows = build_split_comparison(&a, &b, by_label);

        let desktop = &rows[0];
        assert_eq!(desktop.share_v1, 75.0);
        assert_eq!(desktop.share_v2, 0.0);
        assert_eq!(desktop.bounce_diff, -40.0);
        assert_eq!(desktop.duration_diff, -60.0);
        assert!(rows.iter().all(|r| r.share_v2.is_finite()));
        assert_eq!(rows[1].share_v1, 25.0);
    }

    #[test]
    fn joins_numeric_device_codes_with_names() {
        let rows = build_split_comparison(
            &[SplitShare::with_share("2", 40.0)],
            &[SplitShare::with_share("mobile", 55.5)],
            by_label,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "mobile");
        assert_eq!(rows[0].share_diff, 15.5);
    }

    #[test]
    fn share_of_zero_total_is_zero() {
        assert_eq!(share_of(10.0, 0.0), 0.0);
        assert_eq!(share_of(0.0, 0.0), 0.0);
        assert_eq!(share_of(25.0, 200.0), 12.5);
    }
}
