//! Per-unit roll-ups of the raw maintenance, finance and distance rows.

use std::collections::BTreeMap;

use fleet_core::keys::normalize_unit_id;
use fleet_core::models::{
    DistanceSummary, FinanceSummary, MaintenanceSummary, OwnershipClass, RawDistanceSample,
    RawFinanceRecord, RawMaintenanceEvent, UnitKey,
};
use tracing::{debug, warn};

// ── Accumulators ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MaintenanceAccumulator {
    unit_id: String,
    repairs: u32,
    cost_sum: f64,
    cost_values: u32,
}

impl MaintenanceAccumulator {
    fn new(unit_id: &str) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            repairs: 0,
            cost_sum: 0.0,
            cost_values: 0,
        }
    }

    fn add_event(&mut self, event: &RawMaintenanceEvent) {
        if event.amount.is_some() {
            self.repairs += 1;
        }
        if let Some(cost) = event.company_covered {
            self.cost_sum += cost;
            self.cost_values += 1;
        }
    }

    fn into_summary(self, key: String) -> MaintenanceSummary {
        let avg_cost_per_repair =
            (self.cost_values > 0).then(|| self.cost_sum / f64::from(self.cost_values));
        MaintenanceSummary {
            key: UnitKey::Known(key),
            unit_id: self.unit_id,
            total_repairs: self.repairs,
            total_company_cost: self.cost_sum,
            avg_cost_per_repair,
        }
    }
}

#[derive(Debug, Clone)]
struct DistanceAccumulator {
    unit_id: String,
    total: f64,
    samples: u32,
}

impl DistanceAccumulator {
    fn new(unit_id: &str) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            total: 0.0,
            samples: 0,
        }
    }

    fn into_summary(self, key: String) -> DistanceSummary {
        DistanceSummary {
            key: UnitKey::Known(key),
            unit_id: self.unit_id,
            total_distance_km: self.total,
            avg_daily_distance_km: self.total / f64::from(self.samples.max(1)),
            data_points: self.samples,
        }
    }
}

// ── FleetAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that groups raw rows by normalized unit key.
///
/// Every summary list is sorted by key (ascending), except that
/// [`project_finance`](Self::project_finance) keeps unset keys in input order
/// after the known ones.
pub struct FleetAggregator;

impl FleetAggregator {
    /// One summary per unit with at least one maintenance event.
    ///
    /// Events without a usable unit id are dropped. `total_repairs` counts
    /// events with an invoice amount; the cost sum and mean ignore events
    /// whose company-covered value is missing.
    pub fn summarize_maintenance(events: &[RawMaintenanceEvent]) -> Vec<MaintenanceSummary> {
        let mut groups: BTreeMap<String, MaintenanceAccumulator> = BTreeMap::new();
        let mut dropped = 0usize;

        for event in events {
            let (UnitKey::Known(key), Some(raw)) =
                (normalize_unit_id(event.unit_id.as_deref()), event.unit_id.as_deref())
            else {
                dropped += 1;
                continue;
            };
            groups
                .entry(key)
                .or_insert_with(|| MaintenanceAccumulator::new(raw))
                .add_event(event);
        }

        if dropped > 0 {
            debug!("Dropped {} maintenance events without a unit id", dropped);
        }

        groups
            .into_iter()
            .map(|(key, acc)| acc.into_summary(key))
            .collect()
    }

    /// Project each finance row to a [`FinanceSummary`] with its derived
    /// liability.
    ///
    /// Rows without a unit id are kept with an unset key. When two rows
    /// share a known key the first one wins and the rest are logged and
    /// dropped.
    pub fn project_finance(records: &[RawFinanceRecord]) -> Vec<FinanceSummary> {
        let mut known: BTreeMap<String, FinanceSummary> = BTreeMap::new();
        let mut unset: Vec<FinanceSummary> = Vec::new();

        for record in records {
            let summary = Self::project_finance_row(record);
            match summary.key.as_known() {
                Some(key) => {
                    if known.contains_key(key) {
                        warn!(
                            "Duplicate finance row for unit {}; keeping the first one",
                            key
                        );
                        continue;
                    }
                    known.insert(key.to_string(), summary);
                }
                None => unset.push(summary),
            }
        }

        known.into_values().chain(unset).collect()
    }

    fn project_finance_row(record: &RawFinanceRecord) -> FinanceSummary {
        let ownership_type = record
            .ownership_type
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        let ownership_class = OwnershipClass::from_ownership_type(ownership_type.as_deref());

        let est_remaining_payments = match record.monthly_payment {
            Some(payment) if payment > 0.0 => payment * 12.0,
            _ => 0.0,
        };
        let total_estimated_liability =
            est_remaining_payments + record.balloon_payment.unwrap_or(0.0);

        FinanceSummary {
            key: normalize_unit_id(record.unit_id.as_deref()),
            unit_id: record.unit_id.clone(),
            ownership_type,
            ownership_class,
            monthly_payment: record.monthly_payment,
            balloon_payment: record.balloon_payment,
            status: record.status.clone(),
            purchase_amount: record.purchase_amount,
            est_remaining_payments,
            total_estimated_liability,
        }
    }

    /// One summary per unit with at least one distance sample.
    ///
    /// Samples missing either the unit id or the distance are dropped.
    pub fn summarize_distance(samples: &[RawDistanceSample]) -> Vec<DistanceSummary> {
        let mut groups: BTreeMap<String, DistanceAccumulator> = BTreeMap::new();
        let mut dropped = 0usize;

        for sample in samples {
            let (UnitKey::Known(key), Some(raw), Some(distance)) = (
                normalize_unit_id(sample.unit_id.as_deref()),
                sample.unit_id.as_deref(),
                sample.distance,
            ) else {
                dropped += 1;
                continue;
            };
            let acc = groups
                .entry(key)
                .or_insert_with(|| DistanceAccumulator::new(raw));
            acc.total += distance;
            acc.samples += 1;
        }

        if dropped > 0 {
            debug!("Dropped {} distance samples without unit id or distance", dropped);
        }

        groups
            .into_iter()
            .map(|(key, acc)| acc.into_summary(key))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn event(unit: Option<&str>, amount: Option<f64>, covered: Option<f64>) -> RawMaintenanceEvent {
        RawMaintenanceEvent {
            unit_id: unit.map(str::to_string),
            amount,
            company_covered: covered,
        }
    }

    fn finance(unit: Option<&str>, ownership: Option<&str>, monthly: Option<f64>, balloon: Option<f64>) -> RawFinanceRecord {
        RawFinanceRecord {
            unit_id: unit.map(str::to_string),
            ownership_type: ownership.map(str::to_string),
            monthly_payment: monthly,
            balloon_payment: balloon,
            status: Some("active".to_string()),
            purchase_amount: None,
        }
    }

    fn sample(unit: Option<&str>, distance: Option<f64>) -> RawDistanceSample {
        RawDistanceSample {
            unit_id: unit.map(str::to_string),
            distance,
        }
    }

    fn known(k: &str) -> UnitKey {
        UnitKey::Known(k.to_string())
    }

    // ── summarize_maintenance ─────────────────────────────────────────────────

    #[test]
    fn test_maintenance_groups_by_normalized_key() {
        let events = vec![
            event(Some("SPOT-123"), Some(500.0), Some(400.0)),
            event(Some(" spot-123 "), Some(300.0), Some(200.0)),
            event(Some("123"), None, Some(100.0)),
            event(Some("77"), Some(10.0), Some(10.0)),
        ];
        let out = FleetAggregator::summarize_maintenance(&events);
        assert_eq!(out.len(), 2);

        let s = &out[0];
        assert_eq!(s.key, known("123"));
        assert_eq!(s.unit_id, "SPOT-123");
        assert_eq!(s.total_repairs, 2);
        assert!((s.total_company_cost - 700.0).abs() < 1e-9);
        assert!((s.avg_cost_per_repair.unwrap() - 700.0 / 3.0).abs() < 1e-9);
        assert_eq!(out[1].key, known("77"));
    }

    #[test]
    fn test_maintenance_drops_events_without_unit() {
        let events = vec![
            event(None, Some(1.0), Some(1.0)),
            event(Some("   "), Some(1.0), Some(1.0)),
            event(Some("SPOT-"), Some(1.0), Some(1.0)),
        ];
        assert!(FleetAggregator::summarize_maintenance(&events).is_empty());
    }

    #[test]
    fn test_maintenance_missing_costs_leave_mean_unset() {
        let events = vec![
            event(Some("5"), Some(10.0), None),
            event(Some("5"), Some(20.0), None),
        ];
        let out = FleetAggregator::summarize_maintenance(&events);
        assert_eq!(out[0].total_repairs, 2);
        assert_eq!(out[0].total_company_cost, 0.0);
        assert!(out[0].avg_cost_per_repair.is_none());
    }

    #[test]
    fn test_maintenance_cost_sum_is_preserved() {
        let events: Vec<RawMaintenanceEvent> = (0..40)
            .map(|i| {
                event(
                    Some(&format!("spot-{}", i % 7)),
                    Some(1.0),
                    if i % 5 == 0 { None } else { Some(f64::from(i) * 12.5) },
                )
            })
            .collect();
        let input_sum: f64 = events.iter().filter_map(|e| e.company_covered).sum();
        let output_sum: f64 = FleetAggregator::summarize_maintenance(&events)
            .iter()
            .map(|s| s.total_company_cost)
            .sum();
        assert!((input_sum - output_sum).abs() < 1e-6);
    }

    #[test]
    fn test_truck_without_events_has_no_summary() {
        let events = vec![event(Some("1"), Some(1.0), Some(1.0))];
        let out = FleetAggregator::summarize_maintenance(&events);
        assert!(out.iter().all(|s| s.key != known("2")));
    }

    // ── project_finance ───────────────────────────────────────────────────────

    #[test]
    fn test_finance_liability_projection() {
        let rows = vec![
            finance(Some("1"), Some("  Lease "), Some(1500.0), Some(10000.0)),
            finance(Some("2"), Some("Owned"), Some(0.0), None),
            finance(Some("3"), None, None, Some(2500.0)),
            finance(Some("4"), Some("finance"), Some(-50.0), None),
        ];
        let out = FleetAggregator::project_finance(&rows);
        assert_eq!(out.len(), 4);

        assert_eq!(out[0].ownership_type.as_deref(), Some("lease"));
        assert_eq!(out[0].ownership_class, OwnershipClass::LeasedFinanced);
        assert_eq!(out[0].est_remaining_payments, 18000.0);
        assert_eq!(out[0].total_estimated_liability, 28000.0);

        assert_eq!(out[1].ownership_class, OwnershipClass::Owned);
        assert_eq!(out[1].est_remaining_payments, 0.0);
        assert_eq!(out[1].total_estimated_liability, 0.0);

        assert_eq!(out[2].ownership_class, OwnershipClass::LeasedFinanced);
        assert_eq!(out[2].total_estimated_liability, 2500.0);

        assert_eq!(out[3].est_remaining_payments, 0.0);
    }

    #[test]
    fn test_finance_keeps_unset_keys_after_known() {
        let rows = vec![
            finance(None, Some("owned"), None, None),
            finance(Some("9"), Some("owned"), None, None),
            finance(Some(""), Some("lease"), None, None),
        ];
        let out = FleetAggregator::project_finance(&rows);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].key, known("9"));
        assert!(out[1].key.is_unset());
        assert_eq!(out[1].ownership_type.as_deref(), Some("owned"));
        assert!(out[2].key.is_unset());
    }

    #[test]
    fn test_finance_duplicate_key_keeps_first() {
        let rows = vec![
            finance(Some("SPOT-9"), Some("owned"), Some(100.0), None),
            finance(Some("9"), Some("lease"), Some(900.0), None),
        ];
        let out = FleetAggregator::project_finance(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].unit_id.as_deref(), Some("SPOT-9"));
        assert_eq!(out[0].monthly_payment, Some(100.0));
    }

    // ── summarize_distance ────────────────────────────────────────────────────

    #[test]
    fn test_distance_totals_and_average() {
        let samples = vec![
            sample(Some("T-1"), Some(100.0)),
            sample(Some("t 1"), Some(300.0)),
            sample(Some("T-1"), None),
            sample(None, Some(50.0)),
            sample(Some("T-2"), Some(0.0)),
        ];
        let out = FleetAggregator::summarize_distance(&samples);
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].key, known("T 1"));
        assert_eq!(out[0].unit_id, "T-1");
        assert_eq!(out[0].total_distance_km, 400.0);
        assert_eq!(out[0].avg_daily_distance_km, 200.0);
        assert_eq!(out[0].data_points, 2);

        assert_eq!(out[1].data_points, 1);
        assert_eq!(out[1].total_distance_km, 0.0);
    }

    #[test]
    fn test_distance_sum_is_preserved() {
        let samples: Vec<RawDistanceSample> = (0..30)
            .map(|i| sample(Some(&format!("{}", i % 4)), Some(f64::from(i) * 3.25)))
            .collect();
        let input_sum: f64 = samples.iter().filter_map(|s| s.distance).sum();
        let output_sum: f64 = FleetAggregator::summarize_distance(&samples)
            .iter()
            .map(|s| s.total_distance_km)
            .sum();
        assert!((input_sum - output_sum).abs() < 1e-6);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(FleetAggregator::summarize_maintenance(&[]).is_empty());
        assert!(FleetAggregator::project_finance(&[]).is_empty());
        assert!(FleetAggregator::summarize_distance(&[]).is_empty());
    }
}
