//! CLI library components for the cartridge converter.

pub mod logging;
pub mod progress;
pub mod summary;
pub mod types;
