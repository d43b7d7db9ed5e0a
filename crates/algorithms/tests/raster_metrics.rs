//! End-to-end runs of the raster metrics on a 2 x 2 grid over a 20 x 20
//! raster of 1 m cells.

mod common;

use common::*;
use geodiv_algorithms::landscape::{vertical_relief, ReliefParams};
use geodiv_algorithms::prelude::*;

/// Rows 10..20 are the southern zones, cols 0..10 the western ones
fn in_zone(row: usize, col: usize, zone: i64) -> bool {
    let south = row >= 10;
    let west = col < 10;
    match zone {
        1 => south && west,
        2 => south && !west,
        3 => !south && west,
        _ => !south && !west,
    }
}

// ---------------------------------------------------------------------------
// Standard deviation
// ---------------------------------------------------------------------------

#[test]
fn raster_std_dev() {
    // Zone 1 alternates 0 and 2, the rest is constant
    let dem = raster(20, |row, col| {
        if in_zone(row, col, 1) {
            ((row + col) % 2) as f64 * 2.0
        } else {
            5.0
        }
    });
    let mut grid = grid();
    let report = run(
        &PlanarEngine,
        Metric::RasterStdDev,
        Landscape::Raster { name: "dem", raster: &dem },
        &mut grid,
        &RunConfig::new("CELL_ID"),
    )
    .unwrap();

    assert_eq!(report.schema.raw_name, "DEM_RSD");
    assert_close(&column(&grid, "DEM_RSD"), &[Some(1.0), Some(0.0), Some(0.0), Some(0.0)]);
    assert_close(&column(&grid, "Std_DEM_RSD"), &[Some(1.0), Some(0.0), Some(0.0), Some(0.0)]);
}

#[test]
fn raster_std_dev_nodata_zone() {
    let mut dem = raster(20, |row, col| if in_zone(row, col, 4) { -9999.0 } else { (row * col) as f64 });
    dem.set_nodata(Some(-9999.0));
    let mut grid = grid();
    let report = run(
        &PlanarEngine,
        Metric::RasterStdDev,
        Landscape::Raster { name: "dem", raster: &dem },
        &mut grid,
        &RunConfig::new("CELL_ID").with_null_policy(NullPolicy::PreserveNull),
    )
    .unwrap();

    assert_eq!(report.aggregates.len(), 4);
    assert!(report.aggregates[3].raw_value.is_none());
    assert!(report.aggregates[3].standardized_value.is_none());
}

// ---------------------------------------------------------------------------
// Circular standard deviation
// ---------------------------------------------------------------------------

#[test]
fn circular_std_dev() {
    // Zone 1 faces east everywhere; zone 2 is split between north and south
    let aspect = raster(20, |row, col| {
        if in_zone(row, col, 1) {
            90.0
        } else if in_zone(row, col, 2) {
            if col % 2 == 0 { 0.0 } else { 180.0 }
        } else {
            45.0
        }
    });
    let mut grid = grid();
    run(
        &PlanarEngine,
        Metric::CircularStdDev,
        Landscape::Raster { name: "aspect", raster: &aspect },
        &mut grid,
        &RunConfig::new("CELL_ID"),
    )
    .unwrap();

    let raw = column(&grid, "ASP_RSDc");
    let spread = 2f64.sqrt().to_degrees();
    assert!(raw[0].unwrap().abs() < 1e-5);
    assert!((raw[1].unwrap() - spread).abs() < 1e-6);
    assert!(raw[2].unwrap().abs() < 1e-5);

    let std = column(&grid, "Std_ASP_RSDc");
    assert!((std[1].unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn circular_std_dev_wraps_around_north() {
    // 350 and 10 degrees are close, unlike their arithmetic spread
    let aspect = raster(20, |_, col| if col % 2 == 0 { 350.0 } else { 10.0 });
    let mut grid = grid();
    let report = run(
        &PlanarEngine,
        Metric::CircularStdDev,
        Landscape::Raster { name: "aspect", raster: &aspect },
        &mut grid,
        &RunConfig::new("CELL_ID"),
    )
    .unwrap();
    for agg in &report.aggregates {
        assert!(agg.raw_value.unwrap() < 11.0);
    }
}

// ---------------------------------------------------------------------------
// Vertical relief
// ---------------------------------------------------------------------------

#[test]
fn flat_relief_is_zero() {
    let dem = raster(20, |_, _| 850.0);
    let mut grid = grid();
    let report = run(
        &PlanarEngine,
        Metric::VerticalRelief,
        Landscape::Raster { name: "dem", raster: &dem },
        &mut grid,
        &RunConfig::new("CELL_ID"),
    )
    .unwrap();

    assert_eq!(report.scaling, Scaling::Degenerate);
    assert_close(&column(&grid, "DEM_RM"), &[Some(0.0); 4]);
    assert_close(&column(&grid, "Std_DEM_RM"), &[Some(0.0); 4]);
}

#[test]
fn relief_of_a_single_step() {
    // One 10 x 10 zone; the west half lies at 0, the east half at 4
    let mut grid = geodiv_core::Layer::new("grid", grid().schema().clone());
    grid.push(grid_cell(0.0, 0.0, 1));
    let dem = raster(10, |_, col| if col < 5 { 0.0 } else { 4.0 });

    let zones = ZoneIndex::build(&PlanarEngine, &grid, "CELL_ID").unwrap();
    let relief = vertical_relief(&PlanarEngine, &zones, &dem, &ReliefParams::default()).unwrap();

    assert_eq!(relief.len(), 1);
    // W-E border points at 0 and 4; N-S runs along the step at 2
    assert!((relief[0].mu_we - 2.0).abs() < 1e-9);
    assert!(relief[0].mu_ns.abs() < 1e-9);
    assert!((relief[0].rm.unwrap() - 0.1).abs() < 1e-9);
}

#[test]
fn relief_ranks_rough_zones_higher() {
    // Ridges inside zone 4 only, clear of the cells its neighbours sample
    // on their shared borders
    let dem = raster(20, |row, col| {
        if in_zone(row, col, 4) && col >= 12 && row <= 8 && (row + col) % 4 == 0 {
            30.0
        } else {
            0.0
        }
    });
    let mut grid = grid();
    let report = run(
        &PlanarEngine,
        Metric::VerticalRelief,
        Landscape::Raster { name: "dem", raster: &dem },
        &mut grid,
        &RunConfig::new("CELL_ID"),
    )
    .unwrap();

    let rm: Vec<f64> = report.aggregates.iter().map(|a| a.raw_value.unwrap()).collect();
    assert_eq!(&rm[..3], &[0.0, 0.0, 0.0]);
    assert!(rm[3] > 0.0);
    assert_close(&column(&grid, "Std_DEM_RM"), &[Some(0.0), Some(0.0), Some(0.0), Some(1.0)]);
}

fn grid_cell(x: f64, y: f64, id: i64) -> Feature {
    Feature::new(square(x, y, x + CELL, y + CELL)).with_property("CELL_ID", id)
}
