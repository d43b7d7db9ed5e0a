//! Steinhaus vertical relief from elevation profiles
//!
//! Relief is measured along W-E and N-S transects through every zone
//! centroid. Global profiles span the whole raster; their local extrema are
//! attributed to the zone whose centroid axis they lie on and whose polygon
//! contains them. Each zone also gets the two points where its own centroid
//! transects leave the polygon, so every elevation chain has a start and an
//! end.
//!
//! Per zone and direction the extrema are ordered along the transect and
//! `mu = sum(sqrt(|dz|))` over consecutive pairs. The index is
//! `RM = (mu_ns + mu_we) / 2 / sqrt(area)`.
//!
//! Reference: Steinhaus, H. (1947). Length, shape and area.

use std::collections::HashMap;

use geo::{Coord, Line, Point};
use geodiv_core::{Error, Raster, Result};
use tracing::{debug, info};

use crate::engine::GeometryEngine;
use crate::zones::{Zone, ZoneId, ZoneIndex};

/// Transect orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    WestEast,
    NorthSouth,
}

impl Direction {
    /// Coordinate that orders points along a transect of this direction
    fn position(self, p: Point<f64>) -> f64 {
        match self {
            Direction::WestEast => p.x(),
            Direction::NorthSouth => p.y(),
        }
    }
}

/// A straight transect; `zone_id` is set only for zone-local transects
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLine {
    pub start: Point<f64>,
    pub end: Point<f64>,
    pub direction: Direction,
    pub zone_id: Option<ZoneId>,
}

/// Local extremum or border crossing with its sampled elevation
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremePoint {
    pub location: Point<f64>,
    pub elevation: f64,
    pub direction: Direction,
    pub zone_id: Option<ZoneId>,
}

/// Parameters for vertical relief
#[derive(Debug, Clone)]
pub struct ReliefParams {
    /// Axis tolerance as a fraction of the cell size (default 0.5)
    pub tolerance_factor: f64,
    /// Profile sampling step as a multiple of the cell width (default 1.0)
    pub step_factor: f64,
}

impl Default for ReliefParams {
    fn default() -> Self {
        Self {
            tolerance_factor: 0.5,
            step_factor: 1.0,
        }
    }
}

/// Relief result for one zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneRelief {
    pub zone_id: ZoneId,
    pub mu_ns: f64,
    pub mu_we: f64,
    pub mu: f64,
    /// `None` when the zone has no area
    pub rm: Option<f64>,
}

/// Values within `tol` of an already kept value are dropped
fn unique_within(mut values: Vec<f64>, tol: f64) -> Vec<f64> {
    values.sort_by(|a, b| a.total_cmp(b));
    let mut unique: Vec<f64> = Vec::new();
    for v in values {
        if unique.last().map_or(true, |&u| (v - u).abs() > tol) {
            unique.push(v);
        }
    }
    unique
}

/// One W-E profile per distinct centroid Y and one N-S profile per distinct
/// centroid X, each spanning the full raster extent.
pub fn global_profiles(zones: &ZoneIndex, dem: &Raster<f64>, params: &ReliefParams) -> Vec<ProfileLine> {
    let extent = dem.extent();
    let x_tol = dem.cell_width() * params.tolerance_factor;
    let y_tol = dem.cell_height() * params.tolerance_factor;

    let centroids: Vec<Point<f64>> = zones.iter().filter_map(|z| z.centroid).collect();
    let ys = unique_within(centroids.iter().map(|c| c.y()).collect(), y_tol);
    let xs = unique_within(centroids.iter().map(|c| c.x()).collect(), x_tol);

    let west_east = ys.into_iter().map(|y| ProfileLine {
        start: Point::new(extent.min_x, y),
        end: Point::new(extent.max_x, y),
        direction: Direction::WestEast,
        zone_id: None,
    });
    let north_south = xs.into_iter().map(|x| ProfileLine {
        start: Point::new(x, extent.min_y),
        end: Point::new(x, extent.max_y),
        direction: Direction::NorthSouth,
        zone_id: None,
    });

    west_east.chain(north_south).collect()
}

/// Evenly spaced sample positions from start to end, both included.
///
/// The count is the profile's longer axis span divided by the step, at
/// least one.
pub fn sample_positions(profile: &ProfileLine, step: f64) -> Vec<Point<f64>> {
    let dx = profile.end.x() - profile.start.x();
    let dy = profile.end.y() - profile.start.y();
    let n = ((dx.abs().max(dy.abs()) / step) as usize).max(1);
    if n == 1 {
        return vec![profile.start];
    }

    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            Point::new(profile.start.x() + dx * t, profile.start.y() + dy * t)
        })
        .collect()
}

/// Strict local extrema of a sampled profile plus its non-null endpoints.
///
/// A sample is an extremum when it and both neighbours are valid and it is
/// strictly above or strictly below both. Profiles with fewer than three
/// valid samples yield nothing.
pub fn detect_extrema(points: &[Point<f64>], values: &[Option<f64>]) -> Vec<(Point<f64>, f64)> {
    let n = values.len().min(points.len());
    if values[..n].iter().filter(|v| v.is_some()).count() < 3 {
        return Vec::new();
    }

    let mut extrema = Vec::new();
    if let Some(first) = values[0] {
        extrema.push((points[0], first));
    }
    for i in 1..n - 1 {
        if let (Some(prev), Some(v), Some(next)) = (values[i - 1], values[i], values[i + 1]) {
            if (v > prev && v > next) || (v < prev && v < next) {
                extrema.push((points[i], v));
            }
        }
    }
    if let Some(last) = values[n - 1] {
        extrema.push((points[n - 1], last));
    }
    extrema
}

/// Zone whose centroid axis passes through `point` and whose polygon
/// contains it; first match in grid order.
fn assign_zone<E: GeometryEngine>(
    engine: &E,
    zones: &ZoneIndex,
    point: Point<f64>,
    direction: Direction,
    x_tol: f64,
    y_tol: f64,
) -> Option<ZoneId> {
    zones
        .iter()
        .find(|zone| {
            let Some(c) = zone.centroid else { return false };
            let on_axis = match direction {
                Direction::WestEast => (point.y() - c.y()).abs() <= y_tol,
                Direction::NorthSouth => (point.x() - c.x()).abs() <= x_tol,
            };
            on_axis && engine.contains(&zone.polygon, &point)
        })
        .map(|zone| zone.id)
}

/// The two centroid transects of a zone, spanning its bounding box
pub fn local_transects(zone: &Zone) -> Vec<ProfileLine> {
    let (Some(c), Some(bb)) = (zone.centroid, zone.bounds) else {
        return Vec::new();
    };
    vec![
        ProfileLine {
            start: Point::new(c.x(), bb.min_y),
            end: Point::new(c.x(), bb.max_y),
            direction: Direction::NorthSouth,
            zone_id: Some(zone.id),
        },
        ProfileLine {
            start: Point::new(bb.min_x, c.y()),
            end: Point::new(bb.max_x, c.y()),
            direction: Direction::WestEast,
            zone_id: Some(zone.id),
        },
    ]
}

/// Points where each zone's centroid transects meet its boundary, with
/// sampled elevation. Points off the raster are dropped.
pub fn border_points<E: GeometryEngine>(engine: &E, zones: &ZoneIndex, dem: &Raster<f64>) -> Vec<ExtremePoint> {
    let mut border = Vec::new();

    for zone in zones {
        for transect in local_transects(zone) {
            let segment = Line::new(Coord::from(transect.start), Coord::from(transect.end));
            let clipped = engine.clip_segment(&zone.polygon, segment);

            let ends: Vec<Point<f64>> = clipped
                .0
                .iter()
                .filter(|ls| ls.0.len() > 1)
                .flat_map(|ls| [ls.0[0], ls.0[ls.0.len() - 1]])
                .map(Point::from)
                .collect();
            let elevations = engine.sample_raster(dem, &ends);

            for (location, elevation) in ends.into_iter().zip(elevations) {
                if let Some(elevation) = elevation {
                    border.push(ExtremePoint {
                        location,
                        elevation,
                        direction: transect.direction,
                        zone_id: transect.zone_id,
                    });
                }
            }
        }
    }

    border
}

/// `sum(sqrt(|dz|))` over consecutive points ordered by position.
///
/// Fewer than two points give 0.
pub fn steinhaus_mu(points: &mut [(f64, f64)]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
        .windows(2)
        .map(|w| (w[1].1 - w[0].1).abs().sqrt())
        .sum()
}

fn check_params(dem: &Raster<f64>, params: &ReliefParams) -> Result<()> {
    if !(dem.cell_width() > 0.0 && dem.cell_height() > 0.0) {
        return Err(Error::InvalidParameter {
            name: "cell_size",
            value: format!("{}x{}", dem.cell_width(), dem.cell_height()),
            reason: "raster cell size must be positive".into(),
        });
    }
    if !(params.tolerance_factor > 0.0) {
        return Err(Error::InvalidParameter {
            name: "tolerance_factor",
            value: params.tolerance_factor.to_string(),
            reason: "must be positive".into(),
        });
    }
    if !(params.step_factor > 0.0) {
        return Err(Error::InvalidParameter {
            name: "step_factor",
            value: params.step_factor.to_string(),
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

/// Extrema of all global profiles, attributed to zones where possible
pub fn profile_extrema<E: GeometryEngine>(
    engine: &E,
    zones: &ZoneIndex,
    dem: &Raster<f64>,
    params: &ReliefParams,
) -> Result<Vec<ExtremePoint>> {
    check_params(dem, params)?;

    let profiles = global_profiles(zones, dem, params);
    let n_we = profiles
        .iter()
        .filter(|p| p.direction == Direction::WestEast)
        .count();
    info!(
        "Generated {} W-E and {} N-S profiles",
        n_we,
        profiles.len() - n_we
    );

    let step = dem.cell_width() * params.step_factor;
    let x_tol = dem.cell_width() * params.tolerance_factor;
    let y_tol = dem.cell_height() * params.tolerance_factor;

    let mut extrema = Vec::new();
    for profile in &profiles {
        let positions = sample_positions(profile, step);
        let values = engine.sample_raster(dem, &positions);
        for (location, elevation) in detect_extrema(&positions, &values) {
            extrema.push(ExtremePoint {
                location,
                elevation,
                direction: profile.direction,
                zone_id: assign_zone(engine, zones, location, profile.direction, x_tol, y_tol),
            });
        }
    }

    let unresolved = extrema.iter().filter(|e| e.zone_id.is_none()).count();
    debug!(
        "Detected {} profile extrema, {} outside every zone axis",
        extrema.len(),
        unresolved
    );
    Ok(extrema)
}

/// Steinhaus vertical relief of every zone, in grid order.
///
/// Zones without any assigned point get `mu = 0`.
pub fn vertical_relief<E: GeometryEngine>(
    engine: &E,
    zones: &ZoneIndex,
    dem: &Raster<f64>,
    params: &ReliefParams,
) -> Result<Vec<ZoneRelief>> {
    let mut points = profile_extrema(engine, zones, dem, params)?;
    let border = border_points(engine, zones, dem);
    debug!("Sampled {} border points", border.len());
    points.extend(border);

    let mut chains: HashMap<(ZoneId, Direction), Vec<(f64, f64)>> = HashMap::new();
    for p in points {
        if let Some(zone_id) = p.zone_id {
            chains
                .entry((zone_id, p.direction))
                .or_default()
                .push((p.direction.position(p.location), p.elevation));
        }
    }

    let results = zones
        .iter()
        .map(|zone| {
            let mut mu_of = |direction| {
                chains
                    .get_mut(&(zone.id, direction))
                    .map_or(0.0, |chain| steinhaus_mu(chain))
            };
            let mu_ns = mu_of(Direction::NorthSouth);
            let mu_we = mu_of(Direction::WestEast);
            let mu = (mu_ns + mu_we) / 2.0;
            ZoneRelief {
                zone_id: zone.id,
                mu_ns,
                mu_we,
                mu,
                rm: (zone.area > 0.0).then(|| mu / zone.area.sqrt()),
            }
        })
        .collect();

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlanarEngine;
    use crate::test_support::grid_layer;
    use approx::assert_relative_eq;
    use geodiv_core::GeoTransform;

    fn dem(rows: usize, cols: usize, f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
        let mut r = Raster::new(rows, cols);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        for row in 0..rows {
            for col in 0..cols {
                r.set(row, col, f(row, col)).unwrap();
            }
        }
        r
    }

    #[test]
    fn test_steinhaus_two_points() {
        let mut pts = vec![(3.0, 4.0), (1.0, 0.0)];
        assert_relative_eq!(steinhaus_mu(&mut pts), 2.0);
        assert_eq!(steinhaus_mu(&mut [(0.0, 9.0)]), 0.0);
        let mut empty: Vec<(f64, f64)> = Vec::new();
        assert_eq!(steinhaus_mu(&mut empty), 0.0);
    }

    #[test]
    fn test_steinhaus_orders_by_position() {
        // Ordered: 0, 4, 0 -> 2 + 2
        let mut pts = vec![(2.0, 0.0), (0.0, 0.0), (1.0, 4.0)];
        assert_relative_eq!(steinhaus_mu(&mut pts), 4.0);
    }

    #[test]
    fn test_detect_extrema() {
        let points: Vec<Point<f64>> = (0..6).map(|i| Point::new(i as f64, 0.0)).collect();
        let values = [Some(1.0), Some(3.0), Some(2.0), Some(5.0), Some(5.0), Some(1.0)];
        let found: Vec<f64> = detect_extrema(&points, &values).into_iter().map(|(_, v)| v).collect();
        // Endpoints, peak at 1, pit at 2; the plateau is not strict
        assert_eq!(found, vec![1.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_detect_extrema_needs_three_valid() {
        let points: Vec<Point<f64>> = (0..4).map(|i| Point::new(i as f64, 0.0)).collect();
        let values = [Some(1.0), None, Some(7.0), None];
        assert!(detect_extrema(&points, &values).is_empty());
    }

    #[test]
    fn test_detect_extrema_skips_null_neighbours() {
        let points: Vec<Point<f64>> = (0..5).map(|i| Point::new(i as f64, 0.0)).collect();
        let values = [None, Some(9.0), Some(1.0), Some(2.0), Some(0.0)];
        let found: Vec<f64> = detect_extrema(&points, &values).into_iter().map(|(_, v)| v).collect();
        assert_eq!(found, vec![1.0, 2.0, 0.0]);
    }

    #[test]
    fn test_sample_positions() {
        let profile = ProfileLine {
            start: Point::new(0.0, 5.0),
            end: Point::new(10.0, 5.0),
            direction: Direction::WestEast,
            zone_id: None,
        };
        let pts = sample_positions(&profile, 1.0);
        assert_eq!(pts.len(), 10);
        assert_relative_eq!(pts[9].x(), 10.0);
        assert_eq!(sample_positions(&profile, 50.0), vec![profile.start]);
    }

    #[test]
    fn test_global_profiles_share_rows_and_columns() {
        let grid = grid_layer(2, 2, 10.0);
        let zones = ZoneIndex::build(&PlanarEngine, &grid, "CELL").unwrap();
        let dem = dem(20, 20, |_, _| 0.0);
        let profiles = global_profiles(&zones, &dem, &ReliefParams::default());
        assert_eq!(profiles.len(), 4);
        let we: Vec<f64> = profiles
            .iter()
            .filter(|p| p.direction == Direction::WestEast)
            .map(|p| p.start.y())
            .collect();
        assert_eq!(we, vec![5.0, 15.0]);
        assert!(profiles.iter().all(|p| p.zone_id.is_none()));
    }

    #[test]
    fn test_shared_axis_extrema_go_to_containing_zone() {
        // Two zones side by side share the W-E axis at y = 5; a peak lies
        // in the west zone and a pit in the east one
        let grid = grid_layer(2, 1, 10.0);
        let zones = ZoneIndex::build(&PlanarEngine, &grid, "CELL").unwrap();
        let dem = dem(10, 20, |_, col| match col {
            5 => 50.0,
            14 => -20.0,
            _ => 0.0,
        });

        let extrema = profile_extrema(&PlanarEngine, &zones, &dem, &ReliefParams::default()).unwrap();
        let west_east: Vec<&ExtremePoint> = extrema
            .iter()
            .filter(|e| e.direction == Direction::WestEast)
            .collect();

        let peak = west_east
            .iter()
            .max_by(|a, b| a.elevation.total_cmp(&b.elevation))
            .unwrap();
        assert!(peak.elevation > 0.0 && peak.location.x() < 10.0);
        assert_eq!(peak.zone_id, Some(ZoneId(1)));
        let pit = west_east
            .iter()
            .min_by(|a, b| a.elevation.total_cmp(&b.elevation))
            .unwrap();
        assert!(pit.elevation < 0.0 && pit.location.x() > 10.0);
        assert_eq!(pit.zone_id, Some(ZoneId(2)));

        for e in &extrema {
            match e.zone_id {
                Some(ZoneId(1)) => assert!(e.location.x() < 10.0, "{e:?}"),
                Some(ZoneId(2)) => assert!(e.location.x() > 10.0, "{e:?}"),
                Some(other) => panic!("unknown zone {other}"),
                None => {}
            }
        }
    }

    #[test]
    fn test_flat_dem_has_no_relief() {
        let grid = grid_layer(2, 2, 10.0);
        let zones = ZoneIndex::build(&PlanarEngine, &grid, "CELL").unwrap();
        let dem = dem(20, 20, |_, _| 312.0);
        let relief = vertical_relief(&PlanarEngine, &zones, &dem, &ReliefParams::default()).unwrap();
        assert_eq!(relief.len(), 4);
        for r in relief {
            assert_eq!(r.mu, 0.0);
            assert_eq!(r.rm, Some(0.0));
        }
    }

    #[test]
    fn test_ramp_relief_comes_from_border_points() {
        // Elevation equals the column index; one 10 x 10 zone
        let grid = grid_layer(1, 1, 10.0);
        let zones = ZoneIndex::build(&PlanarEngine, &grid, "CELL").unwrap();
        let dem = dem(10, 10, |_, col| col as f64);

        let relief = vertical_relief(&PlanarEngine, &zones, &dem, &ReliefParams::default()).unwrap();
        let r = &relief[0];
        // W-E border points sample 0 and 9; N-S is flat at x = 5
        assert_relative_eq!(r.mu_we, 3.0, epsilon = 1e-9);
        assert_relative_eq!(r.mu_ns, 0.0, epsilon = 1e-9);
        assert_relative_eq!(r.rm.unwrap(), 0.15, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_params() {
        let grid = grid_layer(1, 1, 10.0);
        let zones = ZoneIndex::build(&PlanarEngine, &grid, "CELL").unwrap();
        let dem = dem(10, 10, |_, _| 0.0);
        let params = ReliefParams {
            step_factor: 0.0,
            ..Default::default()
        };
        assert!(vertical_relief(&PlanarEngine, &zones, &dem, &params).is_err());
    }
}
