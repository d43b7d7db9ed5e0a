//! Geodiversity metric tools
//!
//! Every metric runs through the same pipeline: validate, index zones,
//! decorate the grid with working fields, aggregate per zone, standardize,
//! join the results back and clean up.

mod metric;
mod run;
mod schema;
mod validate;

pub use metric::{LandscapeKind, Metric};
pub use run::{run, Landscape, RunConfig, RunReport};
pub use schema::OutputSchema;
pub use validate::validate;
