use crate::analysis::format::round_to;
use crate::models::diff::{Absence, DiffPolicy, DiffRecord, DiffStatus, Direction, NoiseFloor};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Records joined under one key: (side A, side B)
pub type Joined<'a, T> = (Option<&'a T>, Option<&'a T>);

/// Full outer join on `key_of`. A later duplicate on the same side replaces the earlier one.
pub fn outer_join<'a, T, K, F>(a: &'a [T], b: &'a [T], key_of: F) -> BTreeMap<K, Joined<'a, T>>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut joined: BTreeMap<K, Joined<'a, T>> = BTreeMap::new();
    for item in a {
        joined.entry(key_of(item)).or_insert((None, None)).0 = Some(item);
    }
    for item in b {
        joined.entry(key_of(item)).or_insert((None, None)).1 = Some(item);
    }
    joined
}

/// Diff two entity collections: one record per key in A ∪ B, sorted by
/// descending magnitude with ascending keys breaking ties.
pub fn diff_entities<T, K, FK, FV>(
    entities_a: &[T],
    entities_b: &[T],
    key_of: FK,
    value_of: FV,
    policy: &DiffPolicy,
) -> Vec<DiffRecord<K>>
where
    K: Ord,
    FK: Fn(&T) -> K,
    FV: Fn(&T) -> f64,
{
    let mut records: Vec<DiffRecord<K>> = outer_join(entities_a, entities_b, key_of)
        .into_iter()
        .map(|(key, (a, b))| diff_record(key, a.map(&value_of), b.map(&value_of), policy))
        .collect();
    sort_by_magnitude(&mut records);
    records
}

pub fn diff_record<K>(
    key: K,
    value_a: Option<f64>,
    value_b: Option<f64>,
    policy: &DiffPolicy,
) -> DiffRecord<K> {
    let (status, delta) = match (value_a, value_b) {
        (Some(a), Some(b)) => (classify_change(a, b, policy), Some(b - a)),
        (None, Some(_)) => (DiffStatus::New, None),
        (Some(_), None) => (
            match policy.absence {
                Absence::Removed => DiffStatus::Removed,
                Absence::Resolved => DiffStatus::Resolved,
            },
            None,
        ),
        // Nothing to compare.
        (None, None) => (DiffStatus::Stable, None),
    };

    DiffRecord {
        key,
        status,
        value_a,
        value_b,
        delta,
    }
}

/// Status for a key present in both versions.
pub fn classify_change(value_a: f64, value_b: f64, policy: &DiffPolicy) -> DiffStatus {
    if value_a == 0.0 && value_b == 0.0 {
        return DiffStatus::Stable;
    }

    let delta = value_b - value_a;
    if within_noise_floor(value_a, delta, policy) {
        return DiffStatus::Stable;
    }

    match policy.direction {
        Direction::Neutral => DiffStatus::Changed,
        Direction::HigherIsBetter if delta > 0.0 => DiffStatus::Improved,
        Direction::LowerIsBetter if delta < 0.0 => DiffStatus::Improved,
        Direction::HigherIsBetter | Direction::LowerIsBetter => DiffStatus::Worse,
    }
}

/// A zero floor compares at display precision so `+0.0` never counts as a
/// change; any other floor compares the raw delta, strictly above the floor.
fn within_noise_floor(value_a: f64, delta: f64, policy: &DiffPolicy) -> bool {
    match policy.noise_floor {
        NoiseFloor::Absolute(floor) if floor <= 0.0 => round_to(delta, policy.metric.decimals()) == 0.0,
        NoiseFloor::Absolute(floor) => delta.abs() <= floor,
        NoiseFloor::Relative(ratio) => delta.abs() <= ratio * value_a.abs(),
    }
}

pub fn sort_by_magnitude<K: Ord>(records: &mut [DiffRecord<K>]) {
    records.sort_by(compare_by_magnitude);
}

pub fn compare_by_magnitude<K: Ord>(x: &DiffRecord<K>, y: &DiffRecord<K>) -> Ordering {
    y.magnitude()
        .total_cmp(&x.magnitude())
        .then_with(|| x.key.cmp(&y.key))
}

/// Sort the whole set by `compare`, then keep the first `n`.
pub fn top_n_by<T, F>(mut rows: Vec<T>, n: usize, compare: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    rows.sort_by(compare);
    rows.truncate(n);
    rows
}
