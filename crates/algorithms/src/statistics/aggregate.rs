//! Per-zone aggregation of landscape observations

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::landscape::{shannon_diversity, unit_entropy};
use crate::zones::ZoneId;

/// One landscape feature, fragment or point attributed to a zone
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryObservation {
    pub zone_id: ZoneId,
    pub category: Option<String>,
    /// 1 for counts, otherwise a length or an area
    pub measure: f64,
}

impl CategoryObservation {
    pub fn new(zone_id: ZoneId, category: Option<String>, measure: f64) -> Self {
        Self {
            zone_id,
            category,
            measure,
        }
    }
}

/// One output row per zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneAggregate {
    pub zone_id: ZoneId,
    pub raw_value: Option<f64>,
    pub standardized_value: Option<f64>,
}

impl ZoneAggregate {
    pub fn new(zone_id: ZoneId, raw_value: Option<f64>) -> Self {
        Self {
            zone_id,
            raw_value,
            standardized_value: None,
        }
    }
}

/// Quantity computed from a zone's observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateMode {
    /// Distinct non-null categories. Also the point-frequency count once
    /// points have been assigned to their nearest zone.
    CategoryCount,
    /// Number of observations
    ElementCount,
    /// Sum of measures (total length, total area)
    TotalMeasure,
    /// Shannon diversity of categories weighted by measure
    Shannon,
    /// Unit entropy of categories weighted by observation count
    UnitEntropy,
}

#[derive(Default)]
struct ZoneTally {
    count: usize,
    measure: f64,
    categories: BTreeMap<String, (usize, f64)>,
}

/// Aggregate observations into exactly one row per zone, in `zones` order.
///
/// Zones without observations get a null raw value; the null policy of the
/// standardization step decides what that becomes. Observations for zones
/// not in `zones` are ignored.
pub fn aggregate(
    observations: &[CategoryObservation],
    zones: &[ZoneId],
    mode: AggregateMode,
) -> Vec<ZoneAggregate> {
    let mut tallies: HashMap<ZoneId, ZoneTally> = zones.iter().map(|&z| (z, ZoneTally::default())).collect();

    let mut orphans = 0usize;
    for obs in observations {
        let Some(tally) = tallies.get_mut(&obs.zone_id) else {
            orphans += 1;
            continue;
        };
        tally.count += 1;
        tally.measure += obs.measure;
        if let Some(category) = &obs.category {
            let entry = tally.categories.entry(category.clone()).or_default();
            entry.0 += 1;
            entry.1 += obs.measure;
        }
    }
    if orphans > 0 {
        debug!("{} observations fell outside the indexed zones", orphans);
    }

    zones
        .iter()
        .map(|&zone_id| {
            let raw = tallies
                .get(&zone_id)
                .filter(|t| t.count > 0)
                .map(|t| match mode {
                    AggregateMode::CategoryCount => t.categories.len() as f64,
                    AggregateMode::ElementCount => t.count as f64,
                    AggregateMode::TotalMeasure => t.measure,
                    AggregateMode::Shannon => {
                        shannon_diversity(t.categories.values().map(|&(_, m)| m))
                    }
                    AggregateMode::UnitEntropy => {
                        unit_entropy(t.categories.values().map(|&(n, _)| n), t.count)
                    }
                });
            ZoneAggregate::new(zone_id, raw)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn obs(zone: i64, category: &str, measure: f64) -> CategoryObservation {
        CategoryObservation::new(ZoneId(zone), Some(category.to_string()), measure)
    }

    fn raw(aggs: &[ZoneAggregate]) -> Vec<Option<f64>> {
        aggs.iter().map(|a| a.raw_value).collect()
    }

    fn zones(n: i64) -> Vec<ZoneId> {
        (1..=n).map(ZoneId).collect()
    }

    #[test]
    fn test_one_row_per_zone_even_without_observations() {
        for mode in [
            AggregateMode::CategoryCount,
            AggregateMode::ElementCount,
            AggregateMode::TotalMeasure,
            AggregateMode::Shannon,
            AggregateMode::UnitEntropy,
        ] {
            let aggs = aggregate(&[], &zones(5), mode);
            assert_eq!(aggs.len(), 5);
            assert!(aggs.iter().all(|a| a.raw_value.is_none()));
        }
    }

    #[test]
    fn test_category_count() {
        let observations = vec![
            obs(1, "A", 1.0),
            obs(1, "B", 1.0),
            obs(1, "A", 1.0),
            obs(2, "A", 1.0),
            obs(3, "A", 1.0),
            obs(9, "C", 1.0),
        ];
        let aggs = aggregate(&observations, &zones(4), AggregateMode::CategoryCount);
        assert_eq!(raw(&aggs), vec![Some(2.0), Some(1.0), Some(1.0), None]);
        assert!(aggs.iter().all(|a| a.standardized_value.is_none()));
    }

    #[test]
    fn test_element_count_and_total() {
        let observations = vec![obs(2, "x", 1.5), obs(2, "x", 2.5), obs(1, "y", 4.0)];
        let counts = aggregate(&observations, &zones(2), AggregateMode::ElementCount);
        assert_eq!(raw(&counts), vec![Some(1.0), Some(2.0)]);
        let totals = aggregate(&observations, &zones(2), AggregateMode::TotalMeasure);
        assert_eq!(raw(&totals), vec![Some(4.0), Some(4.0)]);
    }

    #[test]
    fn test_shannon_by_area() {
        let observations = vec![obs(1, "A", 10.0), obs(1, "B", 6.0), obs(1, "B", 4.0), obs(2, "A", 3.0)];
        let aggs = aggregate(&observations, &zones(2), AggregateMode::Shannon);
        assert_relative_eq!(aggs[0].raw_value.unwrap(), 2f64.ln(), epsilon = 1e-12);
        assert_eq!(aggs[1].raw_value, Some(0.0));
    }

    #[test]
    fn test_unit_entropy_counts_null_category_in_total() {
        let observations = vec![
            obs(1, "A", 1.0),
            obs(1, "B", 1.0),
            CategoryObservation::new(ZoneId(1), None, 1.0),
            obs(1, "A", 1.0),
        ];
        let aggs = aggregate(&observations, &zones(1), AggregateMode::UnitEntropy);
        let expected = -(0.5f64 * 0.5f64.ln() + 0.25 * 0.25f64.ln());
        assert_relative_eq!(aggs[0].raw_value.unwrap(), expected, epsilon = 1e-12);
    }
}
