//! Evaluation pipeline for a fleet input directory.
//!
//! Loads the exports, builds the per-unit summaries, merges them and
//! classifies every combined record, returning an [`EvaluationReport`] ready
//! for the reporting layer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fleet_core::classifier::{classify_all, Thresholds};
use fleet_core::error::Result;
use fleet_core::keys::normalize_owned;
use fleet_core::models::{Decision, EvaluatedRecord};
use fleet_core::report::ReportTotals;
use tracing::{debug, info};

use crate::aggregator::FleetAggregator;
use crate::merger::merge_summaries;
use crate::reader::{load_inputs, FleetInputs, InputTable};

// ── Public types ──────────────────────────────────────────────────────────────

/// Row accounting for one required table.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TableStats {
    /// Data rows read from the file.
    pub rows_read: usize,
    /// Rows that did not make it into a summary (no unit id, no distance,
    /// duplicate finance key).
    pub rows_excluded: usize,
}

/// Metadata produced alongside the evaluation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunMetadata {
    /// RFC 3339 timestamp when this report was generated.
    pub generated_at: String,
    pub input_dir: PathBuf,
    /// Keyed by table name (`maintenance`, `finance`, `distance`).
    pub tables: BTreeMap<String, TableStats>,
    /// Row counts of the auxiliary exports that were present.
    pub auxiliary_rows: BTreeMap<String, usize>,
    /// Number of combined records produced.
    pub records_created: usize,
    /// Wall-clock seconds spent reading the export files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent aggregating, merging and classifying.
    pub transform_time_seconds: f64,
}

/// The complete output of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub records: Vec<EvaluatedRecord>,
    pub metadata: RunMetadata,
    /// Totals over all records (unfiltered).
    pub totals: ReportTotals,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Load every export under `input_dir` and evaluate the fleet.
pub fn run_evaluation(input_dir: &Path, thresholds: &Thresholds) -> Result<EvaluationReport> {
    info!("Evaluating fleet data in {}", input_dir.display());

    let load_start = std::time::Instant::now();
    let inputs = load_inputs(input_dir)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut report = evaluate_fleet(&inputs, thresholds);
    report.metadata.load_time_seconds = load_time;

    info!(
        "Evaluated {} records ({} keep, {} sell, {} inspect)",
        report.records.len(),
        report.totals.count(Decision::Keep),
        report.totals.count(Decision::Sell),
        report.totals.count(Decision::Inspect),
    );
    Ok(report)
}

/// Run the in-memory part of the pipeline over already loaded inputs.
///
/// 1. Summarize maintenance and distance, project finance.
/// 2. Outer-join the summaries on the unit key.
/// 3. Classify every combined record.
pub fn evaluate_fleet(inputs: &FleetInputs, thresholds: &Thresholds) -> EvaluationReport {
    let transform_start = std::time::Instant::now();

    let maintenance = FleetAggregator::summarize_maintenance(&inputs.maintenance);
    let finance = FleetAggregator::project_finance(&inputs.finance);
    let distance = FleetAggregator::summarize_distance(&inputs.distance);

    let tables = table_stats(inputs, finance.len());
    for (name, stats) in &tables {
        debug!(
            "{}: {} rows read, {} excluded",
            name, stats.rows_read, stats.rows_excluded
        );
    }

    let combined = merge_summaries(maintenance, finance, distance);
    let records = classify_all(combined, thresholds);
    let totals = ReportTotals::from_records(&records);

    let transform_time = transform_start.elapsed().as_secs_f64();

    let metadata = RunMetadata {
        generated_at: Utc::now().to_rfc3339(),
        input_dir: inputs.input_dir.clone(),
        tables,
        auxiliary_rows: inputs
            .auxiliary_rows
            .iter()
            .map(|(table, rows)| (table.name().to_string(), *rows))
            .collect(),
        records_created: records.len(),
        load_time_seconds: 0.0,
        transform_time_seconds: transform_time,
    };

    EvaluationReport {
        records,
        metadata,
        totals,
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn table_stats(inputs: &FleetInputs, finance_kept: usize) -> BTreeMap<String, TableStats> {
    let maintenance_excluded = inputs
        .maintenance
        .iter()
        .filter(|e| normalize_owned(&e.unit_id).is_unset())
        .count();
    let distance_excluded = inputs
        .distance
        .iter()
        .filter(|s| normalize_owned(&s.unit_id).is_unset() || s.distance.is_none())
        .count();

    BTreeMap::from([
        (
            InputTable::Maintenance.name().to_string(),
            TableStats {
                rows_read: inputs.maintenance.len(),
                rows_excluded: maintenance_excluded,
            },
        ),
        (
            InputTable::Finance.name().to_string(),
            TableStats {
                rows_read: inputs.finance.len(),
                rows_excluded: inputs.finance.len().saturating_sub(finance_kept),
            },
        ),
        (
            InputTable::Distance.name().to_string(),
            TableStats {
                rows_read: inputs.distance.len(),
                rows_excluded: distance_excluded,
            },
        ),
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
