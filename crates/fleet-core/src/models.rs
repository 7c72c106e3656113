use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FleetError;

// ── UnitKey ───────────────────────────────────────────────────────────────────

/// Canonical join key for a truck, produced by
/// [`normalize_unit_id`](crate::keys::normalize_unit_id).
///
/// `Unset` stands for a missing identifier. It never compares equal to
/// anything, including another `Unset`, so two records without an identifier
/// are never joined together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum UnitKey {
    Known(String),
    Unset,
}

impl UnitKey {
    /// The key text, or `None` for [`UnitKey::Unset`].
    pub fn as_known(&self) -> Option<&str> {
        match self {
            UnitKey::Known(k) => Some(k.as_str()),
            UnitKey::Unset => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, UnitKey::Unset)
    }
}

impl PartialEq for UnitKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (UnitKey::Known(a), UnitKey::Known(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKey::Known(k) => f.write_str(k),
            UnitKey::Unset => f.write_str("(no unit id)"),
        }
    }
}

impl From<Option<String>> for UnitKey {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(k) if !k.is_empty() => UnitKey::Known(k),
            _ => UnitKey::Unset,
        }
    }
}

impl From<UnitKey> for Option<String> {
    fn from(key: UnitKey) -> Self {
        match key {
            UnitKey::Known(k) => Some(k),
            UnitKey::Unset => None,
        }
    }
}

// ── Raw input rows ────────────────────────────────────────────────────────────

/// One repair / maintenance event from the maintenance export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMaintenanceEvent {
    pub unit_id: Option<String>,
    /// Invoice amount; only its presence matters (it is what gets counted).
    pub amount: Option<f64>,
    /// Portion of the invoice paid by the company.
    pub company_covered: Option<f64>,
}

/// One financing row from the finance export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFinanceRecord {
    pub unit_id: Option<String>,
    pub ownership_type: Option<String>,
    pub monthly_payment: Option<f64>,
    pub balloon_payment: Option<f64>,
    pub status: Option<String>,
    pub purchase_amount: Option<f64>,
}

/// One distance sample (typically one per day) from the distance export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDistanceSample {
    pub unit_id: Option<String>,
    pub distance: Option<f64>,
}

// ── OwnershipClass ────────────────────────────────────────────────────────────

/// Bucket derived from the free-text ownership type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OwnershipClass {
    #[serde(rename = "owned")]
    Owned,
    #[serde(rename = "leased/financed")]
    LeasedFinanced,
}

impl OwnershipClass {
    /// `Owned` when the ownership type mentions "own" in any casing,
    /// `LeasedFinanced` otherwise (including when it is missing).
    pub fn from_ownership_type(ownership_type: Option<&str>) -> Self {
        match ownership_type {
            Some(t) if t.to_lowercase().contains("own") => OwnershipClass::Owned,
            _ => OwnershipClass::LeasedFinanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OwnershipClass::Owned => "owned",
            OwnershipClass::LeasedFinanced => "leased/financed",
        }
    }
}

impl fmt::Display for OwnershipClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnershipClass {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owned" => Ok(OwnershipClass::Owned),
            "leased/financed" => Ok(OwnershipClass::LeasedFinanced),
            other => Err(FleetError::InvalidFilter(other.to_string())),
        }
    }
}

// ── Decision ──────────────────────────────────────────────────────────────────

/// Recommendation attached to every combined record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Keep,
    Sell,
    Inspect,
}

impl Decision {
    pub const ALL: [Decision; 3] = [Decision::Keep, Decision::Sell, Decision::Inspect];

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Keep => "KEEP",
            Decision::Sell => "SELL",
            Decision::Inspect => "INSPECT",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KEEP" => Ok(Decision::Keep),
            "SELL" => Ok(Decision::Sell),
            "INSPECT" => Ok(Decision::Inspect),
            other => Err(FleetError::InvalidFilter(other.to_string())),
        }
    }
}

// ── Summaries ─────────────────────────────────────────────────────────────────

/// Per-unit roll-up of maintenance events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceSummary {
    pub key: UnitKey,
    /// First raw spelling of the unit identifier seen in the table.
    pub unit_id: String,
    /// Number of events carrying an invoice amount.
    pub total_repairs: u32,
    /// Sum of `company_covered` over the unit's events.
    pub total_company_cost: f64,
    /// Mean of `company_covered`; `None` when no event carried a value.
    pub avg_cost_per_repair: Option<f64>,
}

/// Finance row with its derived liability fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSummary {
    pub key: UnitKey,
    pub unit_id: Option<String>,
    /// Lower-cased, trimmed ownership type.
    pub ownership_type: Option<String>,
    pub ownership_class: OwnershipClass,
    pub monthly_payment: Option<f64>,
    pub balloon_payment: Option<f64>,
    pub status: Option<String>,
    pub purchase_amount: Option<f64>,
    /// Twelve months of payments, or 0 when there is no positive payment.
    pub est_remaining_payments: f64,
    /// `est_remaining_payments` plus the balloon payment (missing = 0).
    pub total_estimated_liability: f64,
}

/// Per-unit roll-up of distance samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceSummary {
    pub key: UnitKey,
    pub unit_id: String,
    pub total_distance_km: f64,
    pub avg_daily_distance_km: f64,
    pub data_points: u32,
}

// ── CombinedRecord ────────────────────────────────────────────────────────────

/// Outer-join of the three summaries for one unit.
///
/// A source that had no row for this unit is `None`: its fields are unknown,
/// not zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    pub key: UnitKey,
    pub maintenance: Option<MaintenanceSummary>,
    pub finance: Option<FinanceSummary>,
    pub distance: Option<DistanceSummary>,
}

impl CombinedRecord {
    pub fn new(key: UnitKey) -> Self {
        Self {
            key,
            maintenance: None,
            finance: None,
            distance: None,
        }
    }

    pub fn total_company_cost(&self) -> Option<f64> {
        self.maintenance.as_ref().map(|m| m.total_company_cost)
    }

    pub fn total_distance_km(&self) -> Option<f64> {
        self.distance.as_ref().map(|d| d.total_distance_km)
    }

    pub fn ownership_class(&self) -> Option<OwnershipClass> {
        self.finance.as_ref().map(|f| f.ownership_class)
    }

    pub fn total_estimated_liability(&self) -> Option<f64> {
        self.finance.as_ref().map(|f| f.total_estimated_liability)
    }

    /// How many of the three source tables contributed to this record.
    pub fn source_count(&self) -> usize {
        [
            self.maintenance.is_some(),
            self.finance.is_some(),
            self.distance.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// `true` when only one source table contributed.
    pub fn is_orphan(&self) -> bool {
        self.source_count() == 1
    }

    /// Best label for display: the normalized key, or the first raw
    /// identifier when the key is unset.
    pub fn display_unit(&self) -> String {
        if let Some(k) = self.key.as_known() {
            return k.to_string();
        }
        self.finance
            .as_ref()
            .and_then(|f| f.unit_id.clone())
            .unwrap_or_else(|| self.key.to_string())
    }
}

// ── EvaluatedRecord ───────────────────────────────────────────────────────────

/// Rule of the classifier that produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// High repair spend on a low-utilisation truck.
    HighCostLowUse,
    /// Cheap to run and owned outright.
    CheapOwned,
    /// High utilisation while still economical.
    HighUseEconomical,
    /// No rule matched; needs a manual look.
    NoRuleMatched,
}

impl RuleOutcome {
    pub fn decision(&self) -> Decision {
        match self {
            RuleOutcome::HighCostLowUse => Decision::Sell,
            RuleOutcome::CheapOwned | RuleOutcome::HighUseEconomical => Decision::Keep,
            RuleOutcome::NoRuleMatched => Decision::Inspect,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOutcome::HighCostLowUse => "high_cost_low_use",
            RuleOutcome::CheapOwned => "cheap_owned",
            RuleOutcome::HighUseEconomical => "high_use_economical",
            RuleOutcome::NoRuleMatched => "no_rule_matched",
        }
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleOutcome {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "high_cost_low_use" => Ok(RuleOutcome::HighCostLowUse),
            "cheap_owned" => Ok(RuleOutcome::CheapOwned),
            "high_use_economical" => Ok(RuleOutcome::HighUseEconomical),
            "no_rule_matched" => Ok(RuleOutcome::NoRuleMatched),
            other => Err(FleetError::InvalidFilter(other.to_string())),
        }
    }
}

/// A combined record with its classification attached.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedRecord {
    pub record: CombinedRecord,
    pub decision: Decision,
    pub rule: RuleOutcome,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_key_known_equality() {
        assert_eq!(
            UnitKey::Known("123".to_string()),
            UnitKey::Known("123".to_string())
        );
        assert_ne!(
            UnitKey::Known("123".to_string()),
            UnitKey::Known("124".to_string())
        );
    }

    #[test]
    fn test_unit_key_unset_never_equal() {
        assert_ne!(UnitKey::Unset, UnitKey::Unset);
        assert_ne!(UnitKey::Unset, UnitKey::Known(String::new()));
    }

    #[test]
    fn test_unit_key_serde_as_option() {
        let json = serde_json::to_string(&UnitKey::Known("T 7".to_string())).unwrap();
        assert_eq!(json, "\"T 7\"");
        let json = serde_json::to_string(&UnitKey::Unset).unwrap();
        assert_eq!(json, "null");
        let back: UnitKey = serde_json::from_str("null").unwrap();
        assert!(back.is_unset());
    }

    #[test]
    fn test_ownership_class_from_type() {
        assert_eq!(
            OwnershipClass::from_ownership_type(Some("Company Owned")),
            OwnershipClass::Owned
        );
        assert_eq!(
            OwnershipClass::from_ownership_type(Some("OWNER-OPERATOR")),
            OwnershipClass::Owned
        );
        assert_eq!(
            OwnershipClass::from_ownership_type(Some("lease")),
            OwnershipClass::LeasedFinanced
        );
        assert_eq!(
            OwnershipClass::from_ownership_type(None),
            OwnershipClass::LeasedFinanced
        );
    }

    #[test]
    fn test_decision_parse_and_display() {
        assert_eq!("keep".parse::<Decision>().unwrap(), Decision::Keep);
        assert_eq!(" SELL ".parse::<Decision>().unwrap(), Decision::Sell);
        assert_eq!(Decision::Inspect.to_string(), "INSPECT");
        assert!("scrap".parse::<Decision>().is_err());
    }

    #[test]
    fn test_rule_outcome_maps_to_decision() {
        assert_eq!(RuleOutcome::HighCostLowUse.decision(), Decision::Sell);
        assert_eq!(RuleOutcome::CheapOwned.decision(), Decision::Keep);
        assert_eq!(RuleOutcome::HighUseEconomical.decision(), Decision::Keep);
        assert_eq!(RuleOutcome::NoRuleMatched.decision(), Decision::Inspect);
    }

    #[test]
    fn test_rule_outcome_round_trips_through_str() {
        for rule in [
            RuleOutcome::HighCostLowUse,
            RuleOutcome::CheapOwned,
            RuleOutcome::HighUseEconomical,
            RuleOutcome::NoRuleMatched,
        ] {
            assert_eq!(rule.as_str().parse::<RuleOutcome>().unwrap(), rule);
        }
    }

    #[test]
    fn test_combined_record_accessors_unset_when_source_missing() {
        let record = CombinedRecord::new(UnitKey::Known("42".to_string()));
        assert!(record.total_company_cost().is_none());
        assert!(record.total_distance_km().is_none());
        assert!(record.ownership_class().is_none());
        assert_eq!(record.source_count(), 0);
    }

    #[test]
    fn test_combined_record_orphan_detection() {
        let mut record = CombinedRecord::new(UnitKey::Known("42".to_string()));
        record.distance = Some(DistanceSummary {
            key: UnitKey::Known("42".to_string()),
            unit_id: "42".to_string(),
            total_distance_km: 500.0,
            avg_daily_distance_km: 250.0,
            data_points: 2,
        });
        assert!(record.is_orphan());
        assert_eq!(record.total_distance_km(), Some(500.0));
    }

    #[test]
    fn test_display_unit_falls_back_to_raw_finance_id() {
        let mut record = CombinedRecord::new(UnitKey::Unset);
        assert_eq!(record.display_unit(), "(no unit id)");
        record.finance = Some(FinanceSummary {
            key: UnitKey::Unset,
            unit_id: Some("   ".to_string()),
            ownership_type: None,
            ownership_class: OwnershipClass::LeasedFinanced,
            monthly_payment: None,
            balloon_payment: None,
            status: None,
            purchase_amount: None,
            est_remaining_payments: 0.0,
            total_estimated_liability: 0.0,
        });
        assert_eq!(record.display_unit(), "   ");
    }
}
