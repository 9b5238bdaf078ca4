pub mod alerts;
pub mod cohorts;
pub mod comparison;
pub mod diff;
pub mod format;
pub mod headline;
pub mod issues;
pub mod normalize;
pub mod pages;
pub mod split;
pub mod urls;
