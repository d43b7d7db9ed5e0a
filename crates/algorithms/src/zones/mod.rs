//! Grid zones: stable identifiers, rasterization and transient columns

mod index;
mod rasterize;
mod working;

pub use index::{Zone, ZoneId, ZoneIndex};
pub use rasterize::rasterize_zones;
pub use working::{WorkingFields, STAT_ZONE_ID};
pub(crate) use working::{is_reserved, reserved_in};
