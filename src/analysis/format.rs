use crate::models::diff::MetricKind;

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Signed delta for display: `+` on positive values, precision by metric kind.
pub fn format_delta(delta: f64, metric: MetricKind) -> String {
    let decimals = metric.decimals();
    let mut rounded = round_to(delta, decimals);
    if rounded == 0.0 {
        // Collapse -0.0
        rounded = 0.0;
    }
    let sign = if rounded > 0.0 { "+" } else { "" };
    format!("{}{:.*}{}", sign, decimals, rounded, metric.unit())
}

pub fn format_value(value: f64, metric: MetricKind) -> String {
    format!("{:.*}{}", metric.decimals(), value, metric.unit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_deltas_get_a_plus_sign() {
        assert_eq!(format_delta(20.0, MetricKind::Count), "+20");
        assert_eq!(format_delta(15.0, MetricKind::Duration), "+15.0s");
        assert_eq!(format_delta(0.125, MetricKind::Score), "+0.13");
    }

    #[test]
    fn negative_and_zero_deltas_have_no_plus_sign() {
        assert_eq!(format_delta(-10.0, MetricKind::Percentage), "-10.0%");
        assert_eq!(format_delta(0.0, MetricKind::Percentage), "0.0%");
        assert_eq!(format_delta(-0.04, MetricKind::Percentage), "0.0%");
    }

    #[test]
    fn rounds_to_requested_precision() {
        assert_eq!(round_to(12.345, 1), 12.3);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(7.0, 2), 7.0);
    }
}
