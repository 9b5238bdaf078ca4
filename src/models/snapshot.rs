use serde::{Deserialize, Serialize};

/// Aggregate session metrics for one analyzed version
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub visits: u64,
    /// Percentage in [0, 100]
    #[serde(rename = "bounce", alias = "bounce_rate")]
    pub bounce_rate: f64,
    /// Seconds
    #[serde(rename = "duration", alias = "avg_duration")]
    pub avg_duration: f64,
}

/// Raw B − A deltas for the headline cards
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadlineDeltas {
    pub visits_diff: i64,
    pub bounce_diff: f64,
    pub duration_diff: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_both_wire_names() {
        let short: MetricSnapshot =
            serde_json::from_value(json!({"visits": 10, "bounce": 40.0, "duration": 12.5})).expect("short names");
        let long: MetricSnapshot =
            serde_json::from_value(json!({"visits": 10, "bounce_rate": 40.0, "avg_duration": 12.5})).expect("long names");
        assert_eq!(short, long);
        assert_eq!(serde_json::to_value(long).expect("serialize")["bounce"], json!(40.0));
    }
}
