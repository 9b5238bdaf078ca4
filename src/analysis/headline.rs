use crate::analysis::format::format_delta;
use crate::models::diff::{Direction, MetricKind, Tone};
use crate::models::snapshot::{HeadlineDeltas, MetricSnapshot};
use serde::{Deserialize, Serialize};

/// Headline cards: straight B − A per field, no classification.
pub fn compute_headline_deltas(snapshot_a: &MetricSnapshot, snapshot_b: &MetricSnapshot) -> HeadlineDeltas {
    HeadlineDeltas {
        visits_diff: (i128::from(snapshot_b.visits) - i128::from(snapshot_a.visits))
            .clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64,
        bounce_diff: snapshot_b.bounce_rate - snapshot_a.bounce_rate,
        duration_diff: snapshot_b.avg_duration - snapshot_a.avg_duration,
    }
}

/// Color a delta by what the metric considers better, not by its raw sign.
pub fn tone(delta: f64, direction: Direction) -> Tone {
    if delta == 0.0 || !delta.is_finite() {
        return Tone::Neutral;
    }
    match direction {
        Direction::Neutral => Tone::Neutral,
        Direction::HigherIsBetter if delta > 0.0 => Tone::Positive,
        Direction::LowerIsBetter if delta < 0.0 => Tone::Positive,
        Direction::HigherIsBetter | Direction::LowerIsBetter => Tone::Negative,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineTones {
    pub visits: Tone,
    pub bounce: Tone,
    pub duration: Tone,
}

/// Traffic volume is contextual and always neutral.
pub fn headline_tones(deltas: &HeadlineDeltas) -> HeadlineTones {
    HeadlineTones {
        visits: Tone::Neutral,
        bounce: tone(deltas.bounce_diff, Direction::LowerIsBetter),
        duration: tone(deltas.duration_diff, Direction::HigherIsBetter),
    }
}

/// Plain-text summary shown above the comparison tables
pub fn summarize(v1_name: &str, v2_name: &str, deltas: &HeadlineDeltas) -> String {
    let traffic = match deltas.visits_diff {
        d if d > 0 => "an increase in",
        d if d < 0 => "a decrease in",
        _ => "no change in",
    };
    let mut text = format!(
        "Comparing {v1_name} with {v2_name} shows {traffic} traffic ({} visits).",
        format_delta(deltas.visits_diff as f64, MetricKind::Count)
    );

    let bounce = deltas.bounce_diff.abs();
    match headline_tones(deltas).bounce {
        Tone::Positive => text.push_str(&format!(
            " Bounce rate improved by {bounce:.1}%, users engage better."
        )),
        Tone::Negative => text.push_str(&format!(
            " Bounce rate grew by {bounce:.1}%, which may point to usability problems."
        )),
        Tone::Neutral => text.push_str(" Bounce rate stayed flat."),
    }

    let duration = deltas.duration_diff.abs();
    match headline_tones(deltas).duration {
        Tone::Positive => text.push_str(&format!(
            " Sessions got longer by {duration:.1}s."
        )),
        Tone::Negative => text.push_str(&format!(
            " Sessions got shorter by {duration:.1}s, which may point to problems."
        )),
        Tone::Neutral => text.push_str(" Session duration stayed flat."),
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(visits: u64, bounce: f64, duration: f64) -> MetricSnapshot {
        MetricSnapshot {
            visits,
            bounce_rate: bounce,
            avg_duration: duration,
        }
    }

    #[test]
    fn subtracts_b_minus_a_per_field() {
        let deltas = compute_headline_deltas(&snapshot(100, 50.0, 30.0), &snapshot(120, 40.0, 45.0));
        assert_eq!(
            deltas,
            HeadlineDeltas {
                visits_diff: 20,
                bounce_diff: -10.0,
                duration_diff: 15.0,
            }
        );
    }

    #[test]
    fn visits_can_drop_below_zero_delta() {
        let deltas = compute_headline_deltas(&snapshot(120, 0.0, 0.0), &snapshot(100, 0.0, 0.0));
        assert_eq!(deltas.visits_diff, -20);
    }

    #[test]
    fn huge_visit_counts_keep_the_sign() {
        let up = compute_headline_deltas(&snapshot(0, 0.0, 0.0), &snapshot(u64::MAX, 0.0, 0.0));
        assert_eq!(up.visits_diff, i64::MAX);
        let down = compute_headline_deltas(&snapshot(u64::MAX, 0.0, 0.0), &snapshot(0, 0.0, 0.0));
        assert_eq!(down.visits_diff, i64::MIN);
    }

    #[test]
    fn default_snapshots_give_zero_deltas() {
        let deltas = compute_headline_deltas(&MetricSnapshot::default(), &MetricSnapshot::default());
        assert_eq!(deltas, HeadlineDeltas::default());
        assert!(!deltas.bounce_diff.is_nan());
    }

    #[test]
    fn bounce_drop_is_positive_and_visits_stay_neutral() {
        let tones = headline_tones(&HeadlineDeltas {
            visits_diff: -500,
            bounce_diff: -10.0,
            duration_diff: -3.0,
        });
        assert_eq!(tones.visits, Tone::Neutral);
        assert_eq!(tones.bounce, Tone::Positive);
        assert_eq!(tones.duration, Tone::Negative);
    }

    #[test]
    fn summary_mentions_direction_of_each_metric() {
        let text = summarize(
            "1.0",
            "1.1",
            &HeadlineDeltas {
                visits_diff: 20,
                bounce_diff: -10.0,
                duration_diff: 0.0,
            },
        );
        assert!(text.contains("an increase in traffic (+20 visits)"));
        assert!(text.contains("Bounce rate improved by 10.0%"));
        assert!(text.contains("Session duration stayed flat"));
    }
}
