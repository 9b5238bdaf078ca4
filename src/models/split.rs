use serde::{Deserialize, Serialize};

/// Categorical breakdown dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    Device,
    Browser,
    Os,
}

impl SplitKind {
    pub const ALL: [SplitKind; 3] = [SplitKind::Device, SplitKind::Browser, SplitKind::Os];

    /// Field carrying the category label in backend rows
    pub fn label_field(self) -> &'static str {
        match self {
            SplitKind::Device => "device",
            SplitKind::Browser => "browser",
            SplitKind::Os => "os",
        }
    }

    /// Field carrying the rows in the compare payload
    pub fn payload_field(self) -> &'static str {
        match self {
            SplitKind::Device => "device_split",
            SplitKind::Browser => "browser_split",
            SplitKind::Os => "os_split",
        }
    }

    /// Join key for a raw category label. Devices arrive either as names or
    /// as numeric category codes.
    pub fn category_key(self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return "unknown".to_string();
        }
        match self {
            SplitKind::Device => match trimmed.to_ascii_lowercase().as_str() {
                "1" | "desktop" => "desktop".to_string(),
                "2" | "mobile" => "mobile".to_string(),
                "3" | "tablet" => "tablet".to_string(),
                "4" | "tv" => "tv".to_string(),
                _ => trimmed.to_string(),
            },
            SplitKind::Browser | SplitKind::Os => trimmed.to_string(),
        }
    }
}

/// One category's numbers for a single version
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitShare {
    pub label: String,
    pub visits: u64,
    /// Share of the version's traffic, 0–100; derived from visits when absent
    pub share: Option<f64>,
    /// Bounce rate, 0–100
    pub bounce: f64,
    /// Average session duration, seconds
    pub duration: f64,
}

impl SplitShare {
    pub fn with_share(label: &str, share: f64) -> Self {
        Self {
            label: label.to_string(),
            share: Some(share),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SplitRow {
    pub label: String,
    pub visits_v1: u64,
    pub visits_v2: u64,
    pub share_v1: f64,
    pub share_v2: f64,
    pub share_diff: f64,
    pub bounce_v1: f64,
    pub bounce_v2: f64,
    pub bounce_diff: f64,
    pub duration_v1: f64,
    pub duration_v2: f64,
    pub duration_diff: f64,
}
