//! Transient grid columns owned by one run

use geodiv_core::{AttributeValue, Error, FieldDef, FieldKind, Layer, Result, Schema, Table};
use tracing::{debug, warn};

use crate::statistics::ZoneAggregate;
use crate::tools::OutputSchema;
use crate::zones::ZoneIndex;

/// Stable zone id column joined on while a run is in progress
pub const STAT_ZONE_ID: &str = "StatZoneID";
const STAT_RAW: &str = "StatRaw";
const STAT_STD: &str = "StatStd";

/// Names reserved for the columns a run creates and removes
const OWNED_FIELDS: [&str; 3] = [STAT_ZONE_ID, STAT_RAW, STAT_STD];

/// Owned column names already present on the grid, case-insensitive
pub(crate) fn reserved_in(grid: &Layer) -> Vec<String> {
    grid.schema()
        .fields()
        .iter()
        .filter(|def| is_reserved(&def.name))
        .map(|def| def.name.clone())
        .collect()
}

pub(crate) fn is_reserved(name: &str) -> bool {
    OWNED_FIELDS.iter().any(|owned| owned.eq_ignore_ascii_case(name))
}

/// Scoped owner of the run's transient grid columns.
///
/// Opening decorates the grid with `StatZoneID`; dropping removes whatever
/// owned columns are still present, on success and failure alike. Removal
/// failures are logged and never escalate.
pub struct WorkingFields<'a> {
    grid: &'a mut Layer,
}

impl<'a> WorkingFields<'a> {
    /// Copy every zone id into a fresh `StatZoneID` column.
    ///
    /// Fails with [`Error::FieldConflict`] without touching the grid when any
    /// owned column name is already taken.
    pub fn open(grid: &'a mut Layer, zones: &ZoneIndex) -> Result<Self> {
        let taken = reserved_in(grid);
        if !taken.is_empty() {
            return Err(Error::FieldConflict { fields: taken });
        }

        grid.add_field(FieldDef::new(STAT_ZONE_ID, FieldKind::Integer))?;
        let guard = Self { grid };

        for (i, zone) in zones.iter().enumerate() {
            guard.grid.set_value(i, STAT_ZONE_ID, zone.id.into())?;
        }
        debug!("Decorated {} zones with {}", zones.len(), STAT_ZONE_ID);

        Ok(guard)
    }

    pub fn layer(&self) -> &Layer {
        self.grid
    }

    /// Join raw and standardized values on `StatZoneID` and rename them to
    /// the run's output columns. Returns how many grid cells matched.
    pub fn write_results(&mut self, schema: &OutputSchema, aggregates: &[ZoneAggregate]) -> Result<usize> {
        let mut table = Table::new(Schema::new(vec![
            FieldDef::new(STAT_ZONE_ID, FieldKind::Integer),
            FieldDef::new(STAT_RAW, FieldKind::Double),
            FieldDef::new(STAT_STD, FieldKind::Double),
        ]));
        for agg in aggregates {
            table.push_row(vec![
                agg.zone_id.into(),
                AttributeValue::from_f64(agg.raw_value),
                AttributeValue::from_f64(agg.standardized_value),
            ])?;
        }

        let matched = self
            .grid
            .join_fields(STAT_ZONE_ID, &table, STAT_ZONE_ID, &[STAT_RAW, STAT_STD])?;
        self.grid
            .rename_field(STAT_RAW, &schema.raw_name, Some(&schema.raw_alias))?;
        self.grid
            .rename_field(STAT_STD, &schema.std_name, Some(&schema.std_alias))?;

        Ok(matched)
    }
}

impl Drop for WorkingFields<'_> {
    fn drop(&mut self) {
        for name in OWNED_FIELDS {
            if !self.grid.has_field(name) {
                continue;
            }
            match self.grid.delete_field(name) {
                Ok(()) => debug!("Removed working field '{}'", name),
                Err(e) => warn!("Could not remove working field '{}': {}", name, e),
            }
        }
    }
}
