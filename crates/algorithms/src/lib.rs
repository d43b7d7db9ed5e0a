//! # geodiv algorithms
//!
//! Zonal geodiversity indices over an analytical polygon grid.
//!
//! ## Modules
//!
//! - **engine**: geometry engine trait and its planar implementation
//! - **zones**: zone index, zone rasterization, transient grid columns
//! - **statistics**: zonal raster statistics, aggregation, standardization
//! - **landscape**: Shannon diversity, unit entropy, circular SD, vertical relief
//! - **tools**: metric catalogue and the `run` entry point

pub mod engine;
pub mod landscape;
pub mod statistics;
pub mod tools;
pub mod zones;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::engine::{GeometryEngine, PlanarEngine};
    pub use crate::landscape::{
        circular_std_dev, shannon_diversity, unit_entropy, vertical_relief, ReliefParams,
    };
    pub use crate::statistics::{standardize, NullPolicy, Scaling, ZoneAggregate};
    pub use crate::tools::{run, Landscape, Metric, OutputSchema, RunConfig, RunReport};
    pub use crate::zones::{ZoneId, ZoneIndex};
    pub use geodiv_core::prelude::*;
}

#[cfg(test)]
pub(crate) mod test_support {
    use geo::{polygon, Polygon};
    use geodiv_core::{Feature, FieldDef, FieldKind, Layer, Schema};

    use crate::engine::PlanarEngine;
    use crate::zones::ZoneIndex;

    pub fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
        polygon![
            (x: min_x, y: min_y),
            (x: max_x, y: min_y),
            (x: max_x, y: max_y),
            (x: min_x, y: max_y)
        ]
    }

    /// `cols x rows` square cells of side `size` from the origin, ids
    /// `1..` in field `CELL`, row by row from the bottom
    pub fn grid_layer(cols: usize, rows: usize, size: f64) -> Layer {
        let mut grid = Layer::new("grid", Schema::new(vec![FieldDef::new("CELL", FieldKind::Integer)]));
        for r in 0..rows {
            for c in 0..cols {
                let (x, y) = (c as f64 * size, r as f64 * size);
                let id = (r * cols + c + 1) as i64;
                grid.push(Feature::new(square(x, y, x + size, y + size)).with_property("CELL", id));
            }
        }
        grid
    }

    pub fn zone_grid(cols: usize, rows: usize, size: f64) -> ZoneIndex {
        ZoneIndex::build(&PlanarEngine, &grid_layer(cols, rows, size), "CELL").unwrap()
    }
}
