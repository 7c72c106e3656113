//! Change-aware evaluation manager for the watch runtime.
//!
//! Wraps [`run_evaluation`] with an input fingerprint so the pipeline only
//! re-runs when one of the exports under the input directory changed. There
//! is no retry: a failed run reports its error and the previous report stays
//! available through [`EvaluationManager::last_report`].

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use fleet_core::classifier::Thresholds;
use fleet_core::error::Result;
use fleet_data::analysis::{run_evaluation, EvaluationReport};
use fleet_data::reader::find_input_files;

// ── InputFingerprint ──────────────────────────────────────────────────────────

/// Path, size and modification time of every discovered export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFingerprint {
    files: Vec<(PathBuf, u64, Option<SystemTime>)>,
}

impl InputFingerprint {
    /// Fingerprint the exports currently under `input_dir`.
    pub fn capture(input_dir: &Path) -> Result<Self> {
        let files = find_input_files(input_dir)?
            .into_values()
            .map(|path| {
                let meta = std::fs::metadata(&path).ok();
                let size = meta.as_ref().map(|m| m.len()).unwrap_or(0);
                let modified = meta.and_then(|m| m.modified().ok());
                (path, size, modified)
            })
            .collect();
        Ok(Self { files })
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

// ── EvaluationManager ─────────────────────────────────────────────────────────

/// Re-runs the evaluation pipeline when its inputs change.
///
/// # Example
/// ```no_run
/// use fleet_core::classifier::Thresholds;
/// use fleet_runtime::data_manager::EvaluationManager;
///
/// let mut mgr = EvaluationManager::new("./exports".into(), Thresholds::default());
/// if let Ok(report) = mgr.get_report(false) {
///     println!("records: {}", report.records.len());
/// }
/// ```
pub struct EvaluationManager {
    input_dir: PathBuf,
    thresholds: Thresholds,
    /// Most recent successful report.
    report: Option<EvaluationReport>,
    /// Fingerprint of the inputs `report` was built from.
    fingerprint: Option<InputFingerprint>,
    /// Description of the last failed run, cleared on success.
    last_error: Option<String>,
    /// Number of successful pipeline runs.
    run_count: u64,
}

impl EvaluationManager {
    pub fn new(input_dir: PathBuf, thresholds: Thresholds) -> Self {
        Self {
            input_dir,
            thresholds,
            report: None,
            fingerprint: None,
            last_error: None,
            run_count: 0,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the evaluation for the current inputs.
    ///
    /// The pipeline runs when there is no report yet, when `force` is set or
    /// when the input fingerprint changed; otherwise the previous report is
    /// returned as is. Errors are returned unchanged and leave the previous
    /// report in place.
    pub fn get_report(&mut self, force: bool) -> Result<&EvaluationReport> {
        let fingerprint = match InputFingerprint::capture(&self.input_dir) {
            Ok(fp) => fp,
            Err(e) => {
                tracing::warn!(error = %e, "cannot scan input directory");
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };
        let stale = force || self.fingerprint.as_ref() != Some(&fingerprint);

        if self.report.is_some() && !stale {
            tracing::debug!("inputs unchanged; reusing last evaluation");
            return Ok(self.report.as_ref().expect("report checked above"));
        }
        let report = self.evaluate(fingerprint)?;
        Ok(self.report.insert(report))
    }

    /// Most recent successful report, if any.
    pub fn last_report(&self) -> Option<&EvaluationReport> {
        self.report.as_ref()
    }

    /// Description of the last failed run, or `None` after a success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn run_count(&self) -> u64 {
        self.run_count
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn evaluate(&mut self, fingerprint: InputFingerprint) -> Result<EvaluationReport> {
        match run_evaluation(&self.input_dir, &self.thresholds) {
            Ok(report) => {
                self.run_count += 1;
                tracing::debug!(
                    records = report.records.len(),
                    files = fingerprint.file_count(),
                    run = self.run_count,
                    "evaluation updated"
                );
                self.fingerprint = Some(fingerprint);
                self.last_error = None;
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(error = %e, "evaluation failed; keeping previous report");
                // Next call re-runs even if the files match the last good state.
                self.fingerprint = None;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
