use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{FleetError, Result};
use crate::models::{CombinedRecord, Decision, EvaluatedRecord, OwnershipClass, RuleOutcome};

// ── Thresholds ────────────────────────────────────────────────────────────────

/// Cut-offs used by the decision rules.
///
/// Every field is optional in a rules file; omitted fields keep the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Rule 1: company repair spend above which a low-use truck is sold.
    pub sell_min_company_cost: f64,
    /// Rule 1: distance below which a truck counts as low-use.
    pub sell_max_distance_km: f64,
    /// Rule 2: repair spend below which an owned truck is kept.
    pub keep_owned_max_company_cost: f64,
    /// Rule 3: distance above which a truck counts as high-use.
    pub keep_min_distance_km: f64,
    /// Rule 3: repair spend below which a high-use truck is kept.
    pub keep_high_use_max_company_cost: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            sell_min_company_cost: 30_000.0,
            sell_max_distance_km: 100_000.0,
            keep_owned_max_company_cost: 15_000.0,
            keep_min_distance_km: 200_000.0,
            keep_high_use_max_company_cost: 20_000.0,
        }
    }
}

impl Thresholds {
    /// Load overrides from a JSON rules file. An unreadable or malformed file
    /// is an error, never a silent fallback to the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| FleetError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let thresholds: Thresholds = serde_json::from_str(&content)?;
        thresholds.validate()?;
        tracing::debug!(path = %path.display(), ?thresholds, "loaded rule thresholds");
        Ok(thresholds)
    }

    /// Reject negative or non-finite cut-offs.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("sell_min_company_cost", self.sell_min_company_cost),
            ("sell_max_distance_km", self.sell_max_distance_km),
            ("keep_owned_max_company_cost", self.keep_owned_max_company_cost),
            ("keep_min_distance_km", self.keep_min_distance_km),
            (
                "keep_high_use_max_company_cost",
                self.keep_high_use_max_company_cost,
            ),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(FleetError::Config(format!(
                    "threshold {name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ── Classification ────────────────────────────────────────────────────────────

/// Run the ordered rule set and report which rule fired.
///
/// Rules, first match wins:
/// 1. cost > `sell_min_company_cost` and distance < `sell_max_distance_km` → SELL
/// 2. cost < `keep_owned_max_company_cost` and owned → KEEP
/// 3. distance > `keep_min_distance_km` and cost < `keep_high_use_max_company_cost` → KEEP
/// 4. otherwise → INSPECT
///
/// A rule whose operand is unknown (the truck is missing from that source
/// table) does not match; unknown values are never read as zero. A truck with
/// no repair history is therefore not "cheap", it falls through to INSPECT.
pub fn evaluate(record: &CombinedRecord, thresholds: &Thresholds) -> RuleOutcome {
    let cost = record.total_company_cost();
    let distance = record.total_distance_km();
    let ownership = record.ownership_class();

    if let (Some(cost), Some(distance)) = (cost, distance) {
        if cost > thresholds.sell_min_company_cost && distance < thresholds.sell_max_distance_km {
            return RuleOutcome::HighCostLowUse;
        }
    }

    if let (Some(cost), Some(OwnershipClass::Owned)) = (cost, ownership) {
        if cost < thresholds.keep_owned_max_company_cost {
            return RuleOutcome::CheapOwned;
        }
    }

    if let (Some(cost), Some(distance)) = (cost, distance) {
        if distance > thresholds.keep_min_distance_km
            && cost < thresholds.keep_high_use_max_company_cost
        {
            return RuleOutcome::HighUseEconomical;
        }
    }

    RuleOutcome::NoRuleMatched
}

/// Decision for a single record.
pub fn classify(record: &CombinedRecord, thresholds: &Thresholds) -> Decision {
    evaluate(record, thresholds).decision()
}

/// Attach a decision to every record, preserving order.
pub fn classify_all(records: Vec<CombinedRecord>, thresholds: &Thresholds) -> Vec<EvaluatedRecord> {
    records
        .into_iter()
        .map(|record| {
            let rule = evaluate(&record, thresholds);
            EvaluatedRecord {
                record,
                decision: rule.decision(),
                rule,
            }
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
