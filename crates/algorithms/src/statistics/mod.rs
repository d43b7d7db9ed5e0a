//! Statistical building blocks of the zonal pipelines
//!
//! - **zonal**: raster cell statistics by zone
//! - **aggregate**: per-zone aggregation of landscape observations
//! - **standardize**: min-max scaling with null handling

mod aggregate;
mod standardize;
pub mod zonal;

pub use aggregate::{aggregate, AggregateMode, CategoryObservation, ZoneAggregate};
pub use standardize::{standardize, NullPolicy, Scaling};
pub use zonal::{zonal_statistics, ZonalResult, ZonalStatistic};
