pub mod api;
pub mod compare;
pub mod settings;
pub mod versions;
