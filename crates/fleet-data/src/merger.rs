//! Full outer join of the three per-unit summaries.

use std::collections::BTreeMap;

use fleet_core::models::{
    CombinedRecord, DistanceSummary, FinanceSummary, MaintenanceSummary, UnitKey,
};
use tracing::{debug, warn};

/// Which summary slot of a [`CombinedRecord`] a value goes into.
#[derive(Debug, Clone, Copy)]
enum Source {
    Maintenance,
    Finance,
    Distance,
}

/// Join the summaries on their unit key.
///
/// Each known key yields exactly one record, in ascending key order. A
/// summary with an unset key never joins with anything and becomes its own
/// record, appended after the keyed ones in input order. Sources with no row
/// for a key leave that slot empty.
pub fn merge_summaries(
    maintenance: Vec<MaintenanceSummary>,
    finance: Vec<FinanceSummary>,
    distance: Vec<DistanceSummary>,
) -> Vec<CombinedRecord> {
    let mut keyed: BTreeMap<String, CombinedRecord> = BTreeMap::new();
    let mut unkeyed: Vec<CombinedRecord> = Vec::new();

    for summary in maintenance {
        let key = summary.key.clone();
        place(&mut keyed, &mut unkeyed, key, Source::Maintenance, |r| {
            fill(&mut r.maintenance, summary)
        });
    }
    for summary in finance {
        let key = summary.key.clone();
        place(&mut keyed, &mut unkeyed, key, Source::Finance, |r| {
            fill(&mut r.finance, summary)
        });
    }
    for summary in distance {
        let key = summary.key.clone();
        place(&mut keyed, &mut unkeyed, key, Source::Distance, |r| {
            fill(&mut r.distance, summary)
        });
    }

    debug!(
        "Merged into {} keyed and {} unkeyed records",
        keyed.len(),
        unkeyed.len()
    );

    keyed.into_values().chain(unkeyed).collect()
}

fn place(
    keyed: &mut BTreeMap<String, CombinedRecord>,
    unkeyed: &mut Vec<CombinedRecord>,
    key: UnitKey,
    source: Source,
    insert: impl FnOnce(&mut CombinedRecord) -> bool,
) {
    match key.as_known() {
        Some(k) => {
            let record = keyed
                .entry(k.to_string())
                .or_insert_with(|| CombinedRecord::new(key.clone()));
            if !insert(record) {
                warn!("Duplicate {:?} summary for unit {}; keeping the first one", source, k);
            }
        }
        None => {
            let mut record = CombinedRecord::new(key);
            insert(&mut record);
            unkeyed.push(record);
        }
    }
}

/// Store `value` in an empty slot. Returns `false` if the slot was taken.
fn fill<T>(slot: &mut Option<T>, value: T) -> bool {
    if slot.is_some() {
        return false;
    }
    *slot = Some(value);
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::models::OwnershipClass;
    use std::collections::HashMap;

    fn key(k: Option<&str>) -> UnitKey {
        UnitKey::from(k.map(str::to_string))
    }

    fn maint(k: &str, cost: f64) -> MaintenanceSummary {
        MaintenanceSummary {
            key: key(Some(k)),
            unit_id: k.to_string(),
            total_repairs: 1,
            total_company_cost: cost,
            avg_cost_per_repair: Some(cost),
        }
    }

    fn fin(k: Option<&str>) -> FinanceSummary {
        FinanceSummary {
            key: key(k),
            unit_id: k.map(str::to_string),
            ownership_type: Some("owned".to_string()),
            ownership_class: OwnershipClass::Owned,
            monthly_payment: None,
            balloon_payment: None,
            status: None,
            purchase_amount: None,
            est_remaining_payments: 0.0,
            total_estimated_liability: 0.0,
        }
    }

    fn dist(k: &str, km: f64) -> DistanceSummary {
        DistanceSummary {
            key: key(Some(k)),
            unit_id: k.to_string(),
            total_distance_km: km,
            avg_daily_distance_km: km,
            data_points: 1,
        }
    }

    #[test]
    fn test_full_outer_join() {
        let merged = merge_summaries(
            vec![maint("1", 100.0), maint("2", 200.0)],
            vec![fin(Some("2")), fin(Some("3"))],
            vec![dist("1", 10.0), dist("4", 40.0)],
        );
        let keys: Vec<&str> = merged.iter().filter_map(|r| r.key.as_known()).collect();
        assert_eq!(keys, vec!["1", "2", "3", "4"]);

        assert!(merged[0].maintenance.is_some() && merged[0].distance.is_some());
        assert!(merged[0].finance.is_none());
        assert!(merged[1].maintenance.is_some() && merged[1].finance.is_some());
        assert!(merged[2].finance.is_some() && merged[2].source_count() == 1);
    }

    #[test]
    fn test_each_known_key_appears_once() {
        let merged = merge_summaries(
            (0..20).map(|i| maint(&(i % 10).to_string(), 1.0)).collect(),
            (0..15).map(|i| fin(Some(&i.to_string()))).collect(),
            (5..25).map(|i| dist(&i.to_string(), 1.0)).collect(),
        );
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for r in &merged {
            *seen.entry(r.key.as_known().unwrap()).or_default() += 1;
        }
        assert!(seen.values().all(|n| *n == 1));
        assert_eq!(seen.len(), 25);
    }

    #[test]
    fn test_distance_only_record_has_other_fields_unset() {
        let merged = merge_summaries(vec![], vec![], vec![dist("D 9", 900.0)]);
        assert_eq!(merged.len(), 1);
        let r = &merged[0];
        assert_eq!(r.total_distance_km(), Some(900.0));
        assert!(r.total_company_cost().is_none());
        assert!(r.ownership_class().is_none());
        assert!(r.total_estimated_liability().is_none());
    }

    #[test]
    fn test_unset_keys_stay_separate_and_last() {
        let merged = merge_summaries(
            vec![maint("1", 5.0)],
            vec![fin(None), fin(Some("1")), fin(None)],
            vec![],
        );
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].key.as_known(), Some("1"));
        assert!(merged[0].finance.is_some());
        assert!(merged[1].key.is_unset() && merged[1].finance.is_some());
        assert!(merged[2].key.is_unset() && merged[2].finance.is_some());
        assert!(merged[1].maintenance.is_none());
    }

    #[test]
    fn test_duplicate_summary_keeps_first() {
        let merged = merge_summaries(vec![maint("1", 5.0), maint("1", 9.0)], vec![], vec![]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].total_company_cost(), Some(5.0));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(merge_summaries(vec![], vec![], vec![]).is_empty());
    }
}
