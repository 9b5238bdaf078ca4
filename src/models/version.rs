use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    pub name: String,
}

/// The two versions selected for a comparison (A = `v1`, B = `v2`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPair {
    pub v1: i64,
    pub v2: i64,
}
