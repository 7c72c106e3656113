//! Terminal UI layer for the fleet evaluator.
//!
//! Provides themes, the header and bar-chart components, the records table
//! and the application event loop built on top of [`ratatui`].

pub mod app;
pub mod components;
pub mod table_view;
pub mod themes;

pub use fleet_core as core;
