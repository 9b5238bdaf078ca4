pub mod analysis;
pub mod commands;
pub mod models;
