//! Runtime layer for the fleet evaluator.
//!
//! Re-runs the evaluation when the input exports change and feeds the
//! results to the UI through a channel.

pub mod data_manager;
pub mod orchestrator;

pub use fleet_core as core;
pub use fleet_data as data;
