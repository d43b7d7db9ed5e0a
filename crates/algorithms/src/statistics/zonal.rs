//! Zonal statistics
//!
//! Computes statistics for each zone defined by an integer zone raster.
//! Zones are identified by non-zero integer values; 0 marks cells outside
//! every zone.

use std::collections::HashMap;

use geodiv_core::raster::Raster;
use geodiv_core::{Error, Result};

/// Available zonal statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZonalStatistic {
    Count,
    Sum,
    Mean,
    StdDev,
    Min,
    Max,
    Range,
}

/// Result of zonal statistics for one zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalResult {
    pub zone_id: i32,
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
}

impl ZonalResult {
    pub fn get(&self, statistic: ZonalStatistic) -> f64 {
        match statistic {
            ZonalStatistic::Count => self.count as f64,
            ZonalStatistic::Sum => self.sum,
            ZonalStatistic::Mean => self.mean,
            ZonalStatistic::StdDev => self.std_dev,
            ZonalStatistic::Min => self.min,
            ZonalStatistic::Max => self.max,
            ZonalStatistic::Range => self.range,
        }
    }
}

/// Compute zonal statistics
///
/// For each zone in the zone raster, computes statistics from the
/// corresponding valid cells of the value raster. Zones without any valid
/// cell are absent from the result.
///
/// # Arguments
/// * `values` - Input raster with values to analyze
/// * `zones` - Zone raster (integer identifiers, 0 = no zone)
pub fn zonal_statistics(
    values: &Raster<f64>,
    zones: &Raster<i32>,
) -> Result<HashMap<i32, ZonalResult>> {
    let (rows_v, cols_v) = values.shape();
    let (rows_z, cols_z) = zones.shape();

    if rows_v != rows_z || cols_v != cols_z {
        return Err(Error::SizeMismatch {
            er: rows_v,
            ec: cols_v,
            ar: rows_z,
            ac: cols_z,
        });
    }

    // Collect values per zone
    let mut zone_values: HashMap<i32, Vec<f64>> = HashMap::new();

    for ((row, col), &zone) in zones.data().indexed_iter() {
        if zone == 0 {
            continue;
        }
        if let Some(val) = values.value(row, col) {
            zone_values.entry(zone).or_default().push(val);
        }
    }

    let results = zone_values
        .into_iter()
        .filter(|(_, vals)| !vals.is_empty())
        .map(|(zone_id, vals)| {
            let count = vals.len();
            let sum: f64 = vals.iter().sum();
            let mean = sum / count as f64;
            let var = vals.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
            let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
            let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            let result = ZonalResult {
                zone_id,
                count,
                sum,
                mean,
                std_dev: var.sqrt(),
                min,
                max,
                range: max - min,
            };
            (zone_id, result)
        })
        .collect();

    Ok(results)
}
