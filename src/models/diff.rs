use serde::{Deserialize, Serialize};

/// Which way a metric has to move to count as an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
    /// Changes are reported as signed deltas without a better/worse verdict
    Neutral,
}

/// Minimum change that is still reported as `stable`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum NoiseFloor {
    /// |delta|, rounded to the metric's display precision, at or below this value
    Absolute(f64),
    /// |delta| at or below this fraction of |value in A|
    Relative(f64),
}

/// How a key that disappeared from B is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Absence {
    Removed,
    /// Issue-like entities: absence means the problem no longer reproduces
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Percentage,
    Count,
    Duration,
    Score,
}

impl MetricKind {
    pub fn decimals(self) -> usize {
        match self {
            MetricKind::Percentage | MetricKind::Duration => 1,
            MetricKind::Count => 0,
            MetricKind::Score => 2,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::Percentage => "%",
            MetricKind::Duration => "s",
            MetricKind::Count | MetricKind::Score => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiffPolicy {
    pub direction: Direction,
    pub noise_floor: NoiseFloor,
    pub absence: Absence,
    pub metric: MetricKind,
}

impl DiffPolicy {
    pub fn new(direction: Direction, metric: MetricKind) -> Self {
        Self {
            direction,
            noise_floor: NoiseFloor::Absolute(0.0),
            absence: Absence::Removed,
            metric,
        }
    }

    pub fn higher_is_better(metric: MetricKind) -> Self {
        Self::new(Direction::HigherIsBetter, metric)
    }

    pub fn lower_is_better(metric: MetricKind) -> Self {
        Self::new(Direction::LowerIsBetter, metric)
    }

    pub fn neutral(metric: MetricKind) -> Self {
        Self::new(Direction::Neutral, metric)
    }

    /// Negative floors are treated as zero.
    pub fn with_noise_floor(mut self, noise_floor: NoiseFloor) -> Self {
        self.noise_floor = match noise_floor {
            NoiseFloor::Absolute(v) => NoiseFloor::Absolute(v.max(0.0)),
            NoiseFloor::Relative(v) => NoiseFloor::Relative(v.max(0.0)),
        };
        self
    }

    pub fn resolving(mut self) -> Self {
        self.absence = Absence::Resolved;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    New,
    Removed,
    Resolved,
    Stable,
    Improved,
    Worse,
    Changed,
}

/// One key of a full outer join between two entity collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRecord<K> {
    pub key: K,
    pub status: DiffStatus,
    pub value_a: Option<f64>,
    pub value_b: Option<f64>,
    /// `value_b - value_a`, only when the key exists on both sides
    pub delta: Option<f64>,
}

impl<K> DiffRecord<K> {
    /// Sort weight: |delta|, or the present side's |value| for new/removed keys
    pub fn magnitude(&self) -> f64 {
        self.delta
            .or(self.value_b)
            .or(self.value_a)
            .map(f64::abs)
            .unwrap_or(0.0)
    }

    /// Signed shift: delta, +value for new keys, −value for keys gone from B
    pub fn signed_shift(&self) -> f64 {
        match (self.delta, self.value_a, self.value_b) {
            (Some(delta), _, _) => delta,
            (None, None, Some(b)) => b,
            (None, Some(a), None) => -a,
            _ => 0.0,
        }
    }
}

/// Presentation tone of a delta after applying the metric's policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}
