//! Pre-run validation
//!
//! Everything here is read-only: a run mutates the grid only after every
//! check has passed.

use geodiv_core::{BoundingBox, Error, Layer, Result};
use tracing::debug;

use super::schema::short_prefix;
use super::{Landscape, Metric, OutputSchema, RunConfig};
use crate::engine::GeometryEngine;
use crate::zones::{is_reserved, reserved_in, ZoneIndex};

/// Union of the feature bounding boxes of a layer
pub(crate) fn layer_bounds<E: GeometryEngine>(engine: &E, layer: &Layer) -> Option<BoundingBox> {
    layer
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .filter_map(|g| engine.bounds(g))
        .reduce(|a, b| a.union(&b))
}

/// Output schema for a run, honouring the prefix override
pub(crate) fn output_schema(metric: Metric, landscape: &Landscape<'_>, config: &RunConfig) -> OutputSchema {
    let source = match (&config.category_field, metric.prefix_from_category()) {
        (Some(category), true) => category.as_str(),
        _ => landscape.name(),
    };
    let prefix = config
        .prefix
        .clone()
        .unwrap_or_else(|| short_prefix(source));
    OutputSchema::new(&prefix, source, metric)
}

fn check_not_empty(metric: Metric, landscape: &Landscape<'_>, grid: &Layer) -> Result<()> {
    if grid.is_empty() {
        return Err(Error::EmptyInput {
            layer: grid.name().to_string(),
        });
    }
    if landscape.is_empty() {
        return Err(Error::EmptyInput {
            layer: landscape.name().to_string(),
        });
    }
    if metric.landscape_kind() != landscape.kind() {
        return Err(Error::Configuration(format!(
            "{} expects a {}, got a {} ('{}')",
            metric,
            metric.landscape_kind(),
            landscape.kind(),
            landscape.name()
        )));
    }
    Ok(())
}

fn check_fields(metric: Metric, landscape: &Landscape<'_>, grid: &Layer, config: &RunConfig) -> Result<()> {
    if !grid.has_field(&config.grid_id_field) {
        return Err(Error::Configuration(format!(
            "grid id field '{}' not found in '{}'",
            config.grid_id_field,
            grid.name()
        )));
    }
    if is_reserved(&config.grid_id_field) {
        return Err(Error::Configuration(format!(
            "grid id field '{}' collides with a working column name",
            config.grid_id_field
        )));
    }

    match (&config.category_field, landscape.layer()) {
        (None, _) if metric.requires_category() => Err(Error::Configuration(format!(
            "{} requires a category field",
            metric
        ))),
        (Some(category), Some(layer)) if !layer.has_field(category) => Err(Error::Configuration(format!(
            "category field '{}' not found in '{}'",
            category,
            layer.name()
        ))),
        _ => Ok(()),
    }
}

/// Output columns and working column names already on the grid
fn check_conflicts(schema: &OutputSchema, grid: &Layer) -> Result<()> {
    let mut existing: Vec<String> = schema
        .field_names()
        .into_iter()
        .filter(|name| grid.has_field(name))
        .map(str::to_string)
        .collect();
    existing.extend(reserved_in(grid));
    if existing.is_empty() {
        Ok(())
    } else {
        Err(Error::FieldConflict { fields: existing })
    }
}

fn check_overlap<E: GeometryEngine>(engine: &E, landscape: &Landscape<'_>, grid: &Layer) -> Result<()> {
    let disjoint = || Error::SpatialDisjoint {
        landscape: landscape.name().to_string(),
        grid: grid.name().to_string(),
    };
    let grid_bounds = layer_bounds(engine, grid).ok_or_else(disjoint)?;
    let landscape_bounds = landscape.bounds(engine).ok_or_else(disjoint)?;
    if grid_bounds.is_disjoint(&landscape_bounds) {
        return Err(disjoint());
    }
    Ok(())
}

/// Run every check in order and index the grid zones.
///
/// Order: empty inputs, missing or reserved fields, output and working
/// field conflicts, extent overlap, zone ids.
pub fn validate<E: GeometryEngine>(
    engine: &E,
    metric: Metric,
    landscape: &Landscape<'_>,
    grid: &Layer,
    config: &RunConfig,
) -> Result<(OutputSchema, ZoneIndex)> {
    check_not_empty(metric, landscape, grid)?;
    check_fields(metric, landscape, grid, config)?;

    let schema = output_schema(metric, landscape, config);
    check_conflicts(&schema, grid)?;
    check_overlap(engine, landscape, grid)?;

    let zones = ZoneIndex::build(engine, grid, &config.grid_id_field)?;
    debug!(
        "Validated {} on '{}' against '{}'",
        metric,
        landscape.name(),
        grid.name()
    );
    Ok((schema, zones))
}
