//! # geodiv core
//!
//! Core data types and I/O for geodiversity index computation.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced raster grid with bilinear sampling
//! - `GeoTransform`: affine transformation for georeferencing
//! - `Layer`, `Feature`, `Table`: vector layers with attribute tables
//! - GeoTIFF and GeoJSON I/O

pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{
    AttributeValue, BoundingBox, Feature, FieldDef, FieldKind, Layer, Schema, Table,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, BoundingBox, Feature, FieldDef, FieldKind, Layer, Table};
}
