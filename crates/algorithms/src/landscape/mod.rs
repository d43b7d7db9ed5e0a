//! Landscape metrics
//!
//! - **diversity**: Shannon diversity and unit entropy of category tables
//! - **circular**: circular standard deviation of angular rasters
//! - **relief**: Steinhaus vertical relief along elevation profiles

mod circular;
mod diversity;
mod relief;

pub use circular::{circular_std_dev, zonal_circular_std_dev, CircularSummary};
pub use diversity::{shannon_diversity, unit_entropy};
pub use relief::{
    border_points, detect_extrema, global_profiles, local_transects, profile_extrema,
    sample_positions, steinhaus_mu, vertical_relief, Direction, ExtremePoint, ProfileLine,
    ReliefParams, ZoneRelief,
};
