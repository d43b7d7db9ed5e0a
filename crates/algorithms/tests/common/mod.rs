//! Shared fixtures: a 2 x 2 grid of 10 m cells and helpers to build
//! landscape layers and rasters over it.

#![allow(dead_code)]

use geo::{polygon, Geometry, LineString, Point, Polygon};
use geodiv_core::{AttributeValue, Feature, FieldDef, FieldKind, GeoTransform, Layer, Raster, Schema};

/// Zone ids: 1 = SW, 2 = SE, 3 = NW, 4 = NE
pub const CELL: f64 = 10.0;

pub fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y)
    ]
}

pub fn grid() -> Layer {
    let mut grid = Layer::new(
        "grid",
        Schema::new(vec![FieldDef::new("CELL_ID", FieldKind::Integer)]),
    );
    for r in 0..2 {
        for c in 0..2 {
            let (x, y) = (c as f64 * CELL, r as f64 * CELL);
            grid.push(
                Feature::new(square(x, y, x + CELL, y + CELL))
                    .with_property("CELL_ID", (r * 2 + c + 1) as i64),
            );
        }
    }
    grid
}

/// Layer with one text field `field`
pub fn layer<G>(name: &str, field: &str, features: Vec<(G, Option<&str>)>) -> Layer
where
    G: Into<Geometry<f64>>,
{
    let mut layer = Layer::new(name, Schema::new(vec![FieldDef::new(field, FieldKind::Text)]));
    for (geometry, category) in features {
        let value = category.map_or(AttributeValue::Null, AttributeValue::from);
        layer.push(Feature::new(geometry).with_property(field, value));
    }
    layer
}

pub fn line(coords: Vec<(f64, f64)>) -> LineString<f64> {
    LineString::from(coords)
}

pub fn point(x: f64, y: f64) -> Point<f64> {
    Point::new(x, y)
}

/// 1 m raster over `[0, size] x [0, size]`; `f(row, col)` with row 0 at
/// the top
pub fn raster(size: usize, f: impl Fn(usize, usize) -> f64) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    for row in 0..size {
        for col in 0..size {
            r.set(row, col, f(row, col)).unwrap();
        }
    }
    r
}

/// Raw or standardized column of the grid as floats
pub fn column(grid: &Layer, field: &str) -> Vec<Option<f64>> {
    (0..grid.len())
        .map(|i| grid.value(i, field).and_then(AttributeValue::as_f64))
        .collect()
}

pub fn assert_close(actual: &[Option<f64>], expected: &[Option<f64>]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        match (a, e) {
            (Some(a), Some(e)) => assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}"),
            (None, None) => {}
            _ => panic!("{actual:?} vs {expected:?}"),
        }
    }
}
