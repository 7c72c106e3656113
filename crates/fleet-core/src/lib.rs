//! Domain layer for the fleet evaluator.
//!
//! Holds the record types shared by every crate, the unit-id normaliser, the
//! KEEP / SELL / INSPECT classifier, report filtering, display formatting,
//! CLI settings and the common error type. Nothing here touches the
//! filesystem except the settings and rules-file loaders.

pub mod classifier;
pub mod error;
pub mod formatting;
pub mod keys;
pub mod models;
pub mod report;
pub mod settings;

pub use error::{FleetError, Result};
