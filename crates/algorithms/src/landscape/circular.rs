//! Circular statistics for angular rasters (aspect, orientation)
//!
//! Angles are in degrees. Dispersion is measured through the mean resultant
//! length of the unit vectors, which handles the 0/360 wrap-around that an
//! ordinary standard deviation gets wrong.

use geodiv_core::{Raster, Result};

use crate::engine::GeometryEngine;
use crate::zones::ZoneIndex;

/// Sums of sines and cosines over a sample of angles
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CircularSummary {
    pub n: usize,
    pub sin_sum: f64,
    pub cos_sum: f64,
}

impl CircularSummary {
    pub fn from_degrees<I>(angles: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        angles
            .into_iter()
            .filter(|a| a.is_finite())
            .fold(Self::default(), |acc, deg| {
                let rad = deg.to_radians();
                Self {
                    n: acc.n + 1,
                    sin_sum: acc.sin_sum + rad.sin(),
                    cos_sum: acc.cos_sum + rad.cos(),
                }
            })
    }

    /// `R̄ = sqrt(S² + C²) / n`, `None` for an empty sample
    pub fn mean_resultant_length(&self) -> Option<f64> {
        if self.n == 0 {
            return None;
        }
        Some(self.sin_sum.hypot(self.cos_sum) / self.n as f64)
    }

    /// `SDc = (180/π) * sqrt(2 * (1 - R̄))` in degrees, `None` for an empty
    /// sample
    pub fn circular_std_dev(&self) -> Option<f64> {
        let r = self.mean_resultant_length()?;
        // Rounding can push R̄ slightly above 1
        let radicand = (2.0 * (1.0 - r)).max(0.0);
        Some(radicand.sqrt().to_degrees())
    }
}

/// Circular standard deviation of a sample of angles in degrees
pub fn circular_std_dev(angles: &[f64]) -> Option<f64> {
    CircularSummary::from_degrees(angles.iter().copied()).circular_std_dev()
}

/// Circular standard deviation of the raster cells in each zone.
///
/// Zones without a valid cell get `None`.
pub fn zonal_circular_std_dev<E: GeometryEngine>(
    engine: &E,
    zones: &ZoneIndex,
    angles: &Raster<f64>,
) -> Result<Vec<Option<f64>>> {
    let sines = angles.map_valid(|deg| deg.to_radians().sin());
    let cosines = angles.map_valid(|deg| deg.to_radians().cos());

    let sin_stats = engine.zonal_raster_stats(zones, &sines)?;
    let cos_stats = engine.zonal_raster_stats(zones, &cosines)?;

    Ok(sin_stats
        .into_iter()
        .zip(cos_stats)
        .map(|pair| match pair {
            (Some(s), Some(c)) => CircularSummary {
                n: s.count,
                sin_sum: s.sum,
                cos_sum: c.sum,
            }
            .circular_std_dev(),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_angles() {
        let summary = CircularSummary::from_degrees([137.0; 12]);
        assert_relative_eq!(summary.mean_resultant_length().unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(summary.circular_std_dev().unwrap(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_uniform_angles() {
        let angles: Vec<f64> = (0..360).map(|d| d as f64).collect();
        let summary = CircularSummary::from_degrees(angles.iter().copied());
        assert!(summary.mean_resultant_length().unwrap() < 1e-12);
        assert_relative_eq!(
            circular_std_dev(&angles).unwrap(),
            2f64.sqrt().to_degrees(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_wraparound() {
        // 350 and 10 degrees are 20 degrees apart, not 340
        let narrow = circular_std_dev(&[350.0, 10.0]).unwrap();
        let wide = circular_std_dev(&[90.0, 270.0]).unwrap();
        assert!(narrow < 25.0);
        assert!(wide > narrow);
    }

    #[test]
    fn test_empty_sample() {
        assert_eq!(circular_std_dev(&[]), None);
        assert_eq!(circular_std_dev(&[f64::NAN]), None);
    }
}
