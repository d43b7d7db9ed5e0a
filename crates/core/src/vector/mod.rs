//! Vector layers and attribute tables
//!
//! - [`Feature`]: geometry plus attribute values
//! - [`Layer`]: named feature collection with a typed [`Schema`]
//! - [`Table`]: geometry-less attribute rows used as join sources
//! - [`BoundingBox`]: axis-aligned extent

mod extent;
mod feature;
mod layer;

pub use extent::BoundingBox;
pub use feature::{AttributeValue, Feature};
pub use layer::{FieldDef, FieldKind, Layer, Schema, Table};
