//! Reading and writing grids, landscape layers and rasters

mod geotiff;
mod vector_io;

pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
pub use vector_io::{parse_layer, read_layer, to_geojson_string, write_layer};
