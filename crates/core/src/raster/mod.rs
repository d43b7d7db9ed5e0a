//! Raster data structures and sampling

mod element;
mod geotransform;
mod grid;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::Raster;
