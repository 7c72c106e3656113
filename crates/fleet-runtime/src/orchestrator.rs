//! Async watch orchestrator.
//!
//! Runs an [`EvaluationManager`] in a tokio task, sending an
//! [`EvaluationSnapshot`] through an `mpsc` channel whenever the inputs
//! produced a new report or a run failed, so the TUI event loop can consume
//! them without any shared mutable state.

use std::path::PathBuf;
use std::time::Duration;

use fleet_core::classifier::Thresholds;
use fleet_data::analysis::EvaluationReport;
use tokio::sync::mpsc;
use tokio::time;

use crate::data_manager::EvaluationManager;

// ── Public types ──────────────────────────────────────────────────────────────

/// A single watch update forwarded to the TUI layer.
#[derive(Debug, Clone)]
pub struct EvaluationSnapshot {
    /// Latest successful report. On a failed run this is the previous one.
    pub report: Option<EvaluationReport>,
    /// Error of the run that produced this snapshot, if it failed.
    pub error: Option<String>,
    /// Number of successful runs so far.
    pub run_count: u64,
}

// ── WatchOrchestrator ─────────────────────────────────────────────────────────

/// Background re-evaluation loop.
///
/// Call [`WatchOrchestrator::start`] to spin up the loop in a dedicated tokio
/// task and receive a channel endpoint for [`EvaluationSnapshot`] updates.
pub struct WatchOrchestrator {
    /// How often the inputs are checked for changes.
    refresh_interval: Duration,
    input_dir: PathBuf,
    thresholds: Thresholds,
}

impl WatchOrchestrator {
    pub fn new(refresh_secs: u64, input_dir: PathBuf, thresholds: Thresholds) -> Self {
        Self {
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
            input_dir,
            thresholds,
        }
    }

    /// Start the watch loop.
    ///
    /// Returns the receiving end of the snapshot channel and a
    /// [`WatchHandle`] that stops the loop.
    pub fn start(self) -> (mpsc::Receiver<EvaluationSnapshot>, WatchHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.watch_loop(tx).await;
        });

        (rx, WatchHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Evaluate immediately, then re-check every `refresh_interval`. Exits
    /// when the receiver is dropped.
    async fn watch_loop(self, tx: mpsc::Sender<EvaluationSnapshot>) {
        let mut manager = EvaluationManager::new(self.input_dir.clone(), self.thresholds.clone());

        Self::evaluate_and_send(&mut manager, &tx, true).await;

        let mut interval = time::interval(self.refresh_interval);
        // First tick fires immediately; the initial run already happened.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("watch channel closed; exiting loop");
                break;
            }

            Self::evaluate_and_send(&mut manager, &tx, false).await;
        }
    }

    /// Refresh the manager and send a snapshot if anything happened.
    async fn evaluate_and_send(
        manager: &mut EvaluationManager,
        tx: &mpsc::Sender<EvaluationSnapshot>,
        force: bool,
    ) {
        let runs_before = manager.run_count();

        let outcome = manager.get_report(force).map(|_| ());

        let snapshot = match outcome {
            Ok(()) if manager.run_count() == runs_before => {
                tracing::debug!("no input changes");
                return;
            }
            Ok(()) => EvaluationSnapshot {
                report: manager.last_report().cloned(),
                error: None,
                run_count: manager.run_count(),
            },
            Err(e) => EvaluationSnapshot {
                report: manager.last_report().cloned(),
                error: Some(e.to_string()),
                run_count: manager.run_count(),
            },
        };

        if let Err(e) = tx.send(snapshot).await {
            tracing::warn!(error = %e, "failed to send evaluation snapshot; receiver dropped");
        }
    }
}

// ── WatchHandle ───────────────────────────────────────────────────────────────

/// A handle to the background watch task.
pub struct WatchHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Immediately abort the watch loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
