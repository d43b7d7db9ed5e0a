//! Stable zone identifiers for grid cells

use std::collections::HashMap;
use std::fmt;

use geo::{MultiPolygon, Point};
use geodiv_core::{AttributeValue, BoundingBox, Error, Layer, Result};

use crate::engine::{to_multipolygon, GeometryEngine};

/// Identifier of one grid cell, copied from the user's id field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneId(pub i64);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ZoneId> for AttributeValue {
    fn from(id: ZoneId) -> Self {
        AttributeValue::Int(id.0)
    }
}

/// One grid cell with its derived geometry measures
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: ZoneId,
    pub polygon: MultiPolygon<f64>,
    pub centroid: Option<Point<f64>>,
    pub area: f64,
    pub bounds: Option<BoundingBox>,
}

/// All zones of a grid in grid (feature) order, addressable by id
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: Vec<Zone>,
    positions: HashMap<ZoneId, usize>,
}

impl ZoneIndex {
    /// Index the grid's cells by the integer values of `id_field`.
    ///
    /// Ids must be present, integral and unique. Cells without geometry get
    /// an empty polygon and zero area.
    pub fn build<E: GeometryEngine>(engine: &E, grid: &Layer, id_field: &str) -> Result<Self> {
        if !grid.has_field(id_field) {
            return Err(Error::Configuration(format!(
                "grid id field '{}' not found in '{}'",
                id_field,
                grid.name()
            )));
        }

        let mut zones = Vec::with_capacity(grid.len());
        let mut positions = HashMap::with_capacity(grid.len());

        for (i, feature) in grid.iter().enumerate() {
            let raw = grid.value(i, id_field).cloned().unwrap_or_default();
            let id = raw.as_i64().map(ZoneId).ok_or_else(|| {
                Error::Configuration(format!(
                    "grid feature {} has a non-integer id '{}' in field '{}'",
                    i, raw, id_field
                ))
            })?;

            if positions.insert(id, i).is_some() {
                return Err(Error::Configuration(format!(
                    "duplicate zone id {} in field '{}'",
                    id, id_field
                )));
            }

            let polygon = match &feature.geometry {
                None => MultiPolygon::new(Vec::new()),
                Some(g) => to_multipolygon(g).ok_or_else(|| {
                    Error::Configuration(format!("grid feature {} is not a polygon", i))
                })?,
            };

            let bounds = engine.bounds(&polygon.clone().into());
            zones.push(Zone {
                id,
                centroid: engine.centroid(&polygon),
                area: engine.area(&polygon),
                bounds,
                polygon,
            });
        }

        Ok(Self { zones, positions })
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Zone> {
        self.zones.iter()
    }

    /// Zone at a position in grid order
    pub fn zone(&self, index: usize) -> Option<&Zone> {
        self.zones.get(index)
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.position(id).map(|i| &self.zones[i])
    }

    /// Grid-order position of a zone id
    pub fn position(&self, id: ZoneId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn ids(&self) -> Vec<ZoneId> {
        self.zones.iter().map(|z| z.id).collect()
    }

    /// Union of the zone bounding boxes
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.zones
            .iter()
            .filter_map(|z| z.bounds)
            .reduce(|a, b| a.union(&b))
    }
}

impl<'a> IntoIterator for &'a ZoneIndex {
    type Item = &'a Zone;
    type IntoIter = std::slice::Iter<'a, Zone>;

    fn into_iter(self) -> Self::IntoIter {
        self.zones.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PlanarEngine;
    use crate::test_support::grid_layer;
    use geodiv_core::Feature;

    #[test]
    fn test_build_from_grid() {
        let grid = grid_layer(2, 2, 10.0);
        let zones = ZoneIndex::build(&PlanarEngine, &grid, "CELL").unwrap();
        assert_eq!(zones.len(), 4);
        assert_eq!(zones.ids(), vec![ZoneId(1), ZoneId(2), ZoneId(3), ZoneId(4)]);

        let z4 = zones.get(ZoneId(4)).unwrap();
        assert!((z4.area - 100.0).abs() < 1e-9);
        let c = z4.centroid.unwrap();
        assert!((c.x() - 15.0).abs() < 1e-9 && (c.y() - 15.0).abs() < 1e-9);
        assert_eq!(zones.position(ZoneId(3)), Some(2));

        let bb = zones.bounds().unwrap();
        assert!((bb.max_x - 20.0).abs() < 1e-12 && (bb.max_y - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_integral_float_ids_accepted() {
        let mut grid = grid_layer(1, 1, 1.0);
        grid.set_value(0, "CELL", AttributeValue::Float(7.0)).unwrap();
        let zones = ZoneIndex::build(&PlanarEngine, &grid, "cell").unwrap();
        assert_eq!(zones.ids(), vec![ZoneId(7)]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut grid = grid_layer(2, 1, 1.0);
        grid.set_value(1, "CELL", AttributeValue::Int(1)).unwrap();
        let err = ZoneIndex::build(&PlanarEngine, &grid, "CELL").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_non_integer_and_missing_ids_rejected() {
        let mut grid = grid_layer(2, 1, 1.0);
        grid.set_value(0, "CELL", AttributeValue::Float(1.5)).unwrap();
        assert!(ZoneIndex::build(&PlanarEngine, &grid, "CELL").is_err());
        assert!(ZoneIndex::build(&PlanarEngine, &grid, "NOPE").unwrap_err().is_configuration());
    }

    #[test]
    fn test_non_polygon_cell_rejected() {
        let mut grid = grid_layer(1, 1, 1.0);
        grid.push(Feature::new(Point::new(0.0, 0.0)).with_property("CELL", 9i64));
        assert!(ZoneIndex::build(&PlanarEngine, &grid, "CELL").is_err());
    }
}
