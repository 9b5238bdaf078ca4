pub mod alert;
pub mod cohort;
pub mod comparison;
pub mod diff;
pub mod issue;
pub mod page;
pub mod snapshot;
pub mod split;
pub mod version;
