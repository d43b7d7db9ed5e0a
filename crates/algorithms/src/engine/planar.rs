//! Planar geometry engine on the `geo` crate

use geo::{
    Area, BooleanOps, BoundingRect, Centroid, Contains, EuclideanDistance, EuclideanLength,
    Geometry, Intersects, Line, LineString, MultiLineString, MultiPolygon, Point, Rect,
};
use geodiv_core::{BoundingBox, Error, Raster, Result};
use tracing::debug;

use super::lines::merge_collinear;
use super::{Fragment, GeometryEngine, LinePiece};
use crate::statistics::{zonal_statistics, ZonalResult};
use crate::zones::{rasterize_zones, ZoneIndex};

/// Geometry engine with Euclidean measurements in map units.
///
/// Suitable for projected grids; areas and lengths come out in CRS units.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarEngine;

impl PlanarEngine {
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn to_bbox(rect: Rect<f64>) -> BoundingBox {
    BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
}

fn overlaps(a: Option<BoundingBox>, b: Option<BoundingBox>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a.intersects(&b))
}

fn geometry_intersects(zone: &MultiPolygon<f64>, geometry: &Geometry<f64>) -> Result<bool> {
    Ok(match geometry {
        Geometry::Point(p) => zone.intersects(p),
        Geometry::MultiPoint(mp) => mp.0.iter().any(|p| zone.intersects(p)),
        Geometry::LineString(ls) => zone.intersects(ls),
        Geometry::MultiLineString(mls) => mls.0.iter().any(|ls| zone.intersects(ls)),
        Geometry::Polygon(p) => zone.intersects(p),
        Geometry::MultiPolygon(mp) => zone.intersects(mp),
        Geometry::Rect(r) => zone.intersects(&r.to_polygon()),
        _ => {
            return Err(Error::GeometryEngine(
                "spatial join supports points, lines and polygons only".into(),
            ))
        }
    })
}

impl GeometryEngine for PlanarEngine {
    fn intersect(&self, zones: &ZoneIndex, polygons: &[MultiPolygon<f64>]) -> Result<Vec<Fragment>> {
        let boxes: Vec<Option<BoundingBox>> =
            polygons.iter().map(|p| p.bounding_rect().map(to_bbox)).collect();

        let mut fragments = Vec::new();
        for (zi, zone) in zones.iter().enumerate() {
            for (fi, polygon) in polygons.iter().enumerate() {
                if !overlaps(zone.bounds, boxes[fi]) {
                    continue;
                }
                for part in zone.polygon.intersection(polygon) {
                    let area = part.unsigned_area();
                    if area > 0.0 {
                        fragments.push(Fragment {
                            zone: zi,
                            feature: fi,
                            polygon: part,
                            area,
                        });
                    }
                }
            }
        }

        debug!("Overlay produced {} fragments", fragments.len());
        Ok(fragments)
    }

    fn clip_lines(&self, zones: &ZoneIndex, lines: &[MultiLineString<f64>]) -> Result<Vec<LinePiece>> {
        let boxes: Vec<Option<BoundingBox>> =
            lines.iter().map(|l| l.bounding_rect().map(to_bbox)).collect();

        let mut pieces = Vec::new();
        for (zi, zone) in zones.iter().enumerate() {
            for (fi, line) in lines.iter().enumerate() {
                if !overlaps(zone.bounds, boxes[fi]) {
                    continue;
                }
                let clipped = zone.polygon.clip(line, false);
                if clipped.0.iter().any(|ls| ls.0.len() > 1) {
                    pieces.push(LinePiece {
                        zone: zi,
                        feature: fi,
                        lines: clipped,
                    });
                }
            }
        }

        debug!("Clipping produced {} line pieces", pieces.len());
        Ok(pieces)
    }

    fn clip_segment(&self, polygon: &MultiPolygon<f64>, segment: Line<f64>) -> MultiLineString<f64> {
        let line = MultiLineString::new(vec![LineString::from(vec![segment.start, segment.end])]);
        polygon.clip(&line, false)
    }

    fn dissolve_by_key(
        &self,
        polygons: &[MultiPolygon<f64>],
        keys: &[Option<String>],
    ) -> Result<Vec<(String, MultiPolygon<f64>)>> {
        if polygons.len() != keys.len() {
            return Err(Error::GeometryEngine(format!(
                "dissolve got {} geometries and {} keys",
                polygons.len(),
                keys.len()
            )));
        }

        let mut groups: Vec<(String, MultiPolygon<f64>)> = Vec::new();
        for (polygon, key) in polygons.iter().zip(keys) {
            let Some(key) = key else { continue };
            match groups.iter_mut().find(|(k, _)| k == key) {
                Some((_, merged)) => *merged = merged.union(polygon),
                None => groups.push((key.clone(), polygon.clone())),
            }
        }
        Ok(groups)
    }

    fn dissolve_lines(&self, lines: &MultiLineString<f64>) -> MultiLineString<f64> {
        merge_collinear(lines)
    }

    fn spatial_join(&self, zones: &ZoneIndex, geometries: &[Geometry<f64>]) -> Result<Vec<Vec<usize>>> {
        let boxes: Vec<Option<BoundingBox>> =
            geometries.iter().map(|g| g.bounding_rect().map(to_bbox)).collect();

        zones
            .iter()
            .map(|zone| {
                let mut hits = Vec::new();
                for (gi, geometry) in geometries.iter().enumerate() {
                    if overlaps(zone.bounds, boxes[gi]) && geometry_intersects(&zone.polygon, geometry)? {
                        hits.push(gi);
                    }
                }
                Ok(hits)
            })
            .collect()
    }

    fn nearest_zone(&self, zones: &ZoneIndex, points: &[Point<f64>]) -> Result<Vec<Option<usize>>> {
        Ok(points
            .iter()
            .map(|point| {
                let mut best: Option<(usize, f64)> = None;
                for (zi, zone) in zones.iter().enumerate() {
                    let d = zone
                        .polygon
                        .0
                        .iter()
                        .map(|poly| point.euclidean_distance(poly))
                        .fold(f64::INFINITY, f64::min);
                    // Strict comparison keeps the first zone in grid order on ties
                    if d.is_finite() && best.map_or(true, |(_, bd)| d < bd) {
                        best = Some((zi, d));
                    }
                }
                best.map(|(zi, _)| zi)
            })
            .collect())
    }

    fn zonal_raster_stats(&self, zones: &ZoneIndex, raster: &Raster<f64>) -> Result<Vec<Option<ZonalResult>>> {
        let zone_raster = rasterize_zones(zones, raster)?;
        let mut stats = zonal_statistics(raster, &zone_raster)?;
        Ok((0..zones.len())
            .map(|zi| stats.remove(&(zi as i32 + 1)))
            .collect())
    }

    fn sample_raster(&self, raster: &Raster<f64>, points: &[Point<f64>]) -> Vec<Option<f64>> {
        points.iter().map(|p| raster.sample(p.x(), p.y())).collect()
    }

    fn area(&self, polygon: &MultiPolygon<f64>) -> f64 {
        polygon.unsigned_area()
    }

    fn length(&self, lines: &MultiLineString<f64>) -> f64 {
        lines.euclidean_length()
    }

    fn centroid(&self, polygon: &MultiPolygon<f64>) -> Option<Point<f64>> {
        polygon.centroid()
    }

    fn contains(&self, polygon: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
        polygon.contains(point)
    }

    fn bounds(&self, geometry: &Geometry<f64>) -> Option<BoundingBox> {
        geometry.bounding_rect().map(to_bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{square, zone_grid};
    use geo::polygon;

    #[test]
    fn test_intersect_splits_multipart_fragments() {
        let zones = zone_grid(2, 1, 10.0);
        // Spans both zones: one fragment in each
        let band = MultiPolygon::new(vec![square(5.0, 2.0, 15.0, 8.0)]);
        let fragments = PlanarEngine.intersect(&zones, &[band]).unwrap();
        assert_eq!(fragments.len(), 2);
        assert!(fragments.iter().all(|f| (f.area - 30.0).abs() < 1e-9));
        assert_eq!(fragments[0].zone, 0);
        assert_eq!(fragments[1].zone, 1);
    }

    #[test]
    fn test_clip_and_dissolve_lines() {
        let zones = zone_grid(1, 1, 10.0);
        let road = MultiLineString::new(vec![
            LineString::from(vec![(-5.0, 5.0), (15.0, 5.0)]),
            LineString::from(vec![(2.0, 5.0), (8.0, 5.0)]),
        ]);
        let pieces = PlanarEngine.clip_lines(&zones, &[road]).unwrap();
        assert_eq!(pieces.len(), 1);
        let dissolved = PlanarEngine.dissolve_lines(&pieces[0].lines);
        assert!((PlanarEngine.length(&dissolved) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dissolve_by_key_skips_null() {
        let polys = vec![
            MultiPolygon::new(vec![square(0.0, 0.0, 1.0, 1.0)]),
            MultiPolygon::new(vec![square(5.0, 5.0, 6.0, 6.0)]),
            MultiPolygon::new(vec![square(1.0, 0.0, 2.0, 1.0)]),
        ];
        let keys = vec![Some("A".to_string()), None, Some("A".to_string())];
        let groups = PlanarEngine.dissolve_by_key(&polys, &keys).unwrap();
        assert_eq!(groups.len(), 1);
        assert!((groups[0].1.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_spatial_join_count_includes_boundary() {
        let zones = zone_grid(2, 1, 10.0);
        let points: Vec<Geometry<f64>> = vec![
            Point::new(1.0, 1.0).into(),
            Point::new(10.0, 5.0).into(),
            Point::new(25.0, 5.0).into(),
        ];
        let counts = PlanarEngine.spatial_join_count(&zones, &points).unwrap();
        assert_eq!(counts, vec![2, 1]);
    }

    #[test]
    fn test_nearest_zone_prefers_grid_order_on_ties() {
        let zones = zone_grid(2, 1, 10.0);
        let points = vec![Point::new(10.0, 5.0), Point::new(25.0, 5.0), Point::new(-3.0, 2.0)];
        let nearest = PlanarEngine.nearest_zone(&zones, &points).unwrap();
        assert_eq!(nearest, vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_contains_excludes_boundary() {
        let poly = MultiPolygon::new(vec![polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)]]);
        assert!(PlanarEngine.contains(&poly, &Point::new(2.0, 2.0)));
        assert!(!PlanarEngine.contains(&poly, &Point::new(0.0, 2.0)));
        let c = PlanarEngine.centroid(&poly).unwrap();
        assert!((c.x() - 2.0).abs() < 1e-12 && (c.y() - 2.0).abs() < 1e-12);
    }
}
