use crate::analysis::diff::{compare_by_magnitude, diff_record, outer_join};
use crate::analysis::format::round_to;
use crate::models::cohort::{CohortDiffRow, CohortRecord, CohortStatus};
use crate::models::diff::{DiffPolicy, MetricKind};

/// Diff audience segments by name on their share of sessions.
pub fn diff_cohorts(cohorts_a: &[CohortRecord], cohorts_b: &[CohortRecord]) -> Vec<CohortDiffRow> {
    let policy = DiffPolicy::neutral(MetricKind::Percentage);

    let mut joined: Vec<_> = outer_join(cohorts_a, cohorts_b, |c| c.name.trim().to_string())
        .into_iter()
        .map(|(name, (c1, c2))| {
            let record = diff_record(name, c1.map(|c| c.percentage), c2.map(|c| c.percentage), &policy);
            (record, c1, c2)
        })
        .collect();
    joined.sort_by(|(x, _, _), (y, _, _)| compare_by_magnitude(x, y));

    joined
        .into_iter()
        .map(|(record, c1, c2)| CohortDiffRow {
            status: CohortStatus::from(record.status),
            share_diff: record.delta.map(|d| round_to(d, 1)),
            name: record.key,
            v1: c1.cloned(),
            v2: c2.cloned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cohort(name: &str, percentage: f64) -> CohortRecord {
        CohortRecord {
            name: name.to_string(),
            percentage,
            ..CohortRecord::default()
        }
    }

    #[test]
    fn joins_segments_by_name() {
        let a = vec![cohort("Explorers", 40.0), cohort("Bouncers", 25.0), cohort("Loyal", 35.0)];
        let b = vec![cohort("Explorers", 30.0), cohort("Loyal", 35.0), cohort("Mobile rush", 35.0)];
        let rows = diff_cohorts(&a, &b);

        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Mobile rush", "Bouncers", "Explorers", "Loyal"]);

        assert_eq!(rows[0].status, CohortStatus::New);
        assert_eq!(rows[0].share_diff, None);
        assert_eq!(rows[1].status, CohortStatus::Removed);
        assert_eq!(rows[2].status, CohortStatus::Changed);
        assert_eq!(rows[2].share_diff, Some(-10.0));
        assert_eq!(rows[3].status, CohortStatus::Stable);
    }
}
