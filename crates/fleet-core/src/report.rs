//! Filtering, ordering and totals for the evaluated fleet.
//!
//! These are the only operations the presentation layer performs on the
//! classifier output; the TUI, the plain-text report and the export all go
//! through them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::Serialize;

use crate::error::{FleetError, Result};
use crate::models::{Decision, EvaluatedRecord, OwnershipClass};

// ── OwnershipFilter ───────────────────────────────────────────────────────────

/// Filter value for the ownership column. `Unknown` selects records without a
/// finance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum OwnershipFilter {
    Owned,
    LeasedFinanced,
    Unknown,
}

impl OwnershipFilter {
    pub const ALL: [OwnershipFilter; 3] = [
        OwnershipFilter::Owned,
        OwnershipFilter::LeasedFinanced,
        OwnershipFilter::Unknown,
    ];

    pub fn of(class: Option<OwnershipClass>) -> Self {
        match class {
            Some(OwnershipClass::Owned) => OwnershipFilter::Owned,
            Some(OwnershipClass::LeasedFinanced) => OwnershipFilter::LeasedFinanced,
            None => OwnershipFilter::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OwnershipFilter::Owned => "owned",
            OwnershipFilter::LeasedFinanced => "leased/financed",
            OwnershipFilter::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OwnershipFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnershipFilter {
    type Err = FleetError;

    /// Accepts `owned`, `leased`, `financed`, `leased/financed` and `unknown`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "owned" => Ok(OwnershipFilter::Owned),
            "leased" | "financed" | "leased/financed" => Ok(OwnershipFilter::LeasedFinanced),
            "unknown" => Ok(OwnershipFilter::Unknown),
            other => Err(FleetError::InvalidFilter(other.to_string())),
        }
    }
}

// ── ReportFilter ──────────────────────────────────────────────────────────────

/// Selection applied to the evaluated records before display or export.
#[derive(Debug, Clone)]
pub struct ReportFilter {
    pub decisions: BTreeSet<Decision>,
    pub ownership: BTreeSet<OwnershipFilter>,
    /// Optional regex matched against the displayed unit label.
    pub unit_pattern: Option<Regex>,
}

impl Default for ReportFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl ReportFilter {
    /// Filter that lets every record through.
    pub fn all() -> Self {
        Self {
            decisions: Decision::ALL.into_iter().collect(),
            ownership: OwnershipFilter::ALL.into_iter().collect(),
            unit_pattern: None,
        }
    }

    /// Build a filter from CLI-style labels. An empty label list means "all".
    pub fn from_labels(
        decisions: &[String],
        ownership: &[String],
        unit_pattern: Option<&str>,
    ) -> Result<Self> {
        let mut filter = Self::all();
        if !decisions.is_empty() {
            filter.decisions = decisions
                .iter()
                .map(|d| d.parse::<Decision>())
                .collect::<Result<_>>()?;
        }
        if !ownership.is_empty() {
            filter.ownership = ownership
                .iter()
                .map(|o| o.parse::<OwnershipFilter>())
                .collect::<Result<_>>()?;
        }
        filter.unit_pattern = unit_pattern.map(Regex::new).transpose()?;
        Ok(filter)
    }

    pub fn matches(&self, record: &EvaluatedRecord) -> bool {
        if !self.decisions.contains(&record.decision) {
            return false;
        }
        if !self
            .ownership
            .contains(&OwnershipFilter::of(record.record.ownership_class()))
        {
            return false;
        }
        match &self.unit_pattern {
            Some(re) => re.is_match(&record.record.display_unit()),
            None => true,
        }
    }

    /// Records that pass the filter, in their original order.
    pub fn apply<'a>(&self, records: &'a [EvaluatedRecord]) -> Vec<&'a EvaluatedRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    /// Add `decision` to the selection, or remove it when already selected.
    pub fn toggle_decision(&mut self, decision: Decision) {
        if !self.decisions.remove(&decision) {
            self.decisions.insert(decision);
        }
    }

    pub fn toggle_ownership(&mut self, ownership: OwnershipFilter) {
        if !self.ownership.remove(&ownership) {
            self.ownership.insert(ownership);
        }
    }

    /// `true` when the filter lets everything through.
    pub fn is_all(&self) -> bool {
        self.decisions.len() == Decision::ALL.len()
            && self.ownership.len() == OwnershipFilter::ALL.len()
            && self.unit_pattern.is_none()
    }

    /// Short human-readable description, e.g. `"KEEP,SELL | owned"`.
    pub fn describe(&self) -> String {
        let decisions: Vec<&str> = self.decisions.iter().map(|d| d.as_str()).collect();
        let ownership: Vec<&str> = self.ownership.iter().map(|o| o.as_str()).collect();
        let mut text = format!("{} | {}", decisions.join(","), ownership.join(","));
        if let Some(re) = &self.unit_pattern {
            text.push_str(&format!(" | /{}/", re.as_str()));
        }
        text
    }
}

// ── Ordering ──────────────────────────────────────────────────────────────────

/// Stable sort by decision label (`INSPECT`, `KEEP`, `SELL`).
pub fn sort_by_decision(records: &mut [&EvaluatedRecord]) {
    records.sort_by(|a, b| a.decision.as_str().cmp(b.decision.as_str()));
}

// ── ReportTotals ──────────────────────────────────────────────────────────────

/// Totals over a set of evaluated records. Unknown values are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTotals {
    pub records: usize,
    pub by_decision: BTreeMap<Decision, usize>,
    pub total_company_cost: f64,
    pub total_distance_km: f64,
    pub total_estimated_liability: f64,
    /// Records that came from a single source table.
    pub orphans: usize,
}

impl ReportTotals {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EvaluatedRecord>,
    {
        let mut totals = Self::default();
        for r in records {
            totals.records += 1;
            *totals.by_decision.entry(r.decision).or_default() += 1;
            totals.total_company_cost += r.record.total_company_cost().unwrap_or(0.0);
            totals.total_distance_km += r.record.total_distance_km().unwrap_or(0.0);
            totals.total_estimated_liability +=
                r.record.total_estimated_liability().unwrap_or(0.0);
            if r.record.is_orphan() {
                totals.orphans += 1;
            }
        }
        totals
    }

    pub fn count(&self, decision: Decision) -> usize {
        self.by_decision.get(&decision).copied().unwrap_or(0)
    }

    /// Share of `decision` among all records, in percent.
    pub fn share(&self, decision: Decision) -> f64 {
        if self.records == 0 {
            return 0.0;
        }
        self.count(decision) as f64 / self.records as f64 * 100.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
