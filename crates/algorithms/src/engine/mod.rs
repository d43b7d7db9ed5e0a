//! Geometry engine
//!
//! Every geometric service the metric pipelines need goes through the
//! [`GeometryEngine`] trait: overlay, dissolve, spatial join, nearest zone,
//! zonal raster statistics, raster sampling and basic measurements.
//! [`PlanarEngine`] implements it on the `geo` crate with planar
//! (projected CRS) arithmetic.

mod lines;
mod planar;

pub use planar::PlanarEngine;

use geo::{Geometry, Line, MultiLineString, MultiPolygon, Point, Polygon};
use geodiv_core::{BoundingBox, Raster, Result};

use crate::statistics::{ZonalResult, ZonalStatistic};
use crate::zones::ZoneIndex;

/// Single-part polygon produced by overlaying a landscape feature on a zone
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Position of the zone in the [`ZoneIndex`]
    pub zone: usize,
    /// Position of the landscape feature in its input slice
    pub feature: usize,
    pub polygon: Polygon<f64>,
    pub area: f64,
}

/// Part of a landscape line lying inside a zone
#[derive(Debug, Clone)]
pub struct LinePiece {
    pub zone: usize,
    pub feature: usize,
    pub lines: MultiLineString<f64>,
}

/// Geometric services used by the zonal aggregation pipelines.
///
/// Zone-level results are always returned in [`ZoneIndex`] order, one entry
/// per zone.
pub trait GeometryEngine {
    /// Overlay polygons on the zones, one fragment per single-part piece
    fn intersect(&self, zones: &ZoneIndex, polygons: &[MultiPolygon<f64>]) -> Result<Vec<Fragment>>;

    /// Clip lines to every zone they cross
    fn clip_lines(&self, zones: &ZoneIndex, lines: &[MultiLineString<f64>]) -> Result<Vec<LinePiece>>;

    /// Part of a segment lying inside a polygon
    fn clip_segment(&self, polygon: &MultiPolygon<f64>, segment: Line<f64>) -> MultiLineString<f64>;

    /// Merge polygons that share a key, in order of first appearance.
    /// Features with a null key are left out.
    fn dissolve_by_key(
        &self,
        polygons: &[MultiPolygon<f64>],
        keys: &[Option<String>],
    ) -> Result<Vec<(String, MultiPolygon<f64>)>>;

    /// Merge overlapping collinear parts so shared stretches count once
    fn dissolve_lines(&self, lines: &MultiLineString<f64>) -> MultiLineString<f64>;

    /// For each zone, the indices of the geometries intersecting it
    fn spatial_join(&self, zones: &ZoneIndex, geometries: &[Geometry<f64>]) -> Result<Vec<Vec<usize>>>;

    /// For each zone, how many geometries intersect it
    fn spatial_join_count(&self, zones: &ZoneIndex, geometries: &[Geometry<f64>]) -> Result<Vec<usize>> {
        Ok(self
            .spatial_join(zones, geometries)?
            .into_iter()
            .map(|hits| hits.len())
            .collect())
    }

    /// Nearest zone of each point, `None` when no zone has a geometry
    fn nearest_zone(&self, zones: &ZoneIndex, points: &[Point<f64>]) -> Result<Vec<Option<usize>>>;

    /// All cell statistics per zone, `None` for zones without valid cells
    fn zonal_raster_stats(&self, zones: &ZoneIndex, raster: &Raster<f64>) -> Result<Vec<Option<ZonalResult>>>;

    /// One cell statistic per zone
    fn zonal_raster_stat(
        &self,
        zones: &ZoneIndex,
        raster: &Raster<f64>,
        statistic: ZonalStatistic,
    ) -> Result<Vec<Option<f64>>> {
        Ok(self
            .zonal_raster_stats(zones, raster)?
            .into_iter()
            .map(|r| r.map(|r| r.get(statistic)))
            .collect())
    }

    /// Interpolated raster value at each point
    fn sample_raster(&self, raster: &Raster<f64>, points: &[Point<f64>]) -> Vec<Option<f64>>;

    fn area(&self, polygon: &MultiPolygon<f64>) -> f64;

    fn length(&self, lines: &MultiLineString<f64>) -> f64;

    fn centroid(&self, polygon: &MultiPolygon<f64>) -> Option<Point<f64>>;

    /// Strict containment; points on the boundary are not contained
    fn contains(&self, polygon: &MultiPolygon<f64>, point: &Point<f64>) -> bool;

    fn bounds(&self, geometry: &Geometry<f64>) -> Option<BoundingBox>;
}

/// Polygonal geometry as a multipolygon, `None` for other geometry types
pub(crate) fn to_multipolygon(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon::new(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon::new(vec![t.to_polygon()])),
        _ => None,
    }
}

/// Linear geometry as a multilinestring, `None` for other geometry types
pub(crate) fn to_multilinestring(geometry: &Geometry<f64>) -> Option<MultiLineString<f64>> {
    match geometry {
        Geometry::LineString(ls) => Some(MultiLineString::new(vec![ls.clone()])),
        Geometry::MultiLineString(mls) => Some(mls.clone()),
        Geometry::Line(l) => Some(MultiLineString::new(vec![geo::LineString::from(vec![l.start, l.end])])),
        _ => None,
    }
}
