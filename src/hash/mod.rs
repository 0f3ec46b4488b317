// Content-matching primitives for delta creation.
//
// This module provides:
// - The rolling hash over NHASH-byte windows
// - The landmark/collide table indexing origin blocks
// - Matcher tuning (`DeltaConfig`) and named profiles

pub mod config;
pub mod rolling;
pub mod table;

pub use config::{DeltaConfig, NHASH, config_for_level};
pub use rolling::RollingHash;
pub use table::LandmarkTable;
