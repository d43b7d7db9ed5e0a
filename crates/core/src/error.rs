//! Error types for geodiversity computations

use thiserror::Error;

/// Main error type for geodiversity operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid run configuration (missing fields, bad ids, bad null policy)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Output fields of a metric are already present on the grid
    #[error(
        "Field(s) {} already exist in the analytical grid attribute table; remove them before re-running the tool",
        .fields.join(", ")
    )]
    FieldConflict { fields: Vec<String> },

    #[error("Landscape layer '{landscape}' does not overlap with grid '{grid}'")]
    SpatialDisjoint { landscape: String, grid: String },

    #[error("Layer '{layer}' has no features")]
    EmptyInput { layer: String },

    /// Failure reported by the geometry engine, propagated verbatim
    #[error("Geometry engine error: {0}")]
    GeometryEngine(String),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error belongs to the configuration class (aborts before mutation)
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::FieldConflict { .. })
    }
}

/// Result type alias for geodiversity operations
pub type Result<T> = std::result::Result<T, Error>;
