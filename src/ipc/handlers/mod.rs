pub mod actions;
pub mod core;
pub mod entries;
pub mod reports;
pub mod sessions;
pub mod students;
