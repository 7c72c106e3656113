//! Data layer for the fleet evaluator.
//!
//! Discovers and reads the xlsx or CSV exports, builds per-unit summaries, joins them
//! and runs the classification pipeline. Also writes and re-reads exported
//! reports.

pub mod aggregator;
pub mod analysis;
pub mod export;
pub mod merger;
pub mod reader;

pub use fleet_core as core;
