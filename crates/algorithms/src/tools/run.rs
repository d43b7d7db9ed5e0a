//! Single entry point shared by every metric

use std::collections::BTreeMap;

use geo::{Geometry, MultiLineString, MultiPolygon, Point};
use geodiv_core::{BoundingBox, Error, Layer, Raster, Result};
use tracing::{debug, info};

use super::validate::{layer_bounds, validate};
use super::{LandscapeKind, Metric, OutputSchema};
use crate::engine::{to_multilinestring, to_multipolygon, GeometryEngine};
use crate::landscape::{vertical_relief, zonal_circular_std_dev, ReliefParams};
use crate::statistics::{
    aggregate, standardize, AggregateMode, CategoryObservation, NullPolicy, Scaling, ZonalStatistic,
    ZoneAggregate,
};
use crate::zones::{WorkingFields, ZoneId, ZoneIndex};

/// Landscape input of a run
#[derive(Debug, Clone, Copy)]
pub enum Landscape<'a> {
    Polygons(&'a Layer),
    Lines(&'a Layer),
    Points(&'a Layer),
    Raster { name: &'a str, raster: &'a Raster<f64> },
}

impl<'a> Landscape<'a> {
    pub fn kind(&self) -> LandscapeKind {
        match *self {
            Landscape::Polygons(_) => LandscapeKind::Polygons,
            Landscape::Lines(_) => LandscapeKind::Lines,
            Landscape::Points(_) => LandscapeKind::Points,
            Landscape::Raster { .. } => LandscapeKind::Raster,
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Landscape::Polygons(l) | Landscape::Lines(l) | Landscape::Points(l) => l.name(),
            Landscape::Raster { name, .. } => name,
        }
    }

    /// The vector layer, `None` for rasters
    pub fn layer(&self) -> Option<&'a Layer> {
        match *self {
            Landscape::Polygons(l) | Landscape::Lines(l) | Landscape::Points(l) => Some(l),
            Landscape::Raster { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match *self {
            Landscape::Raster { raster, .. } => raster.is_empty(),
            _ => self.layer().map_or(true, Layer::is_empty),
        }
    }

    pub(crate) fn bounds<E: GeometryEngine>(&self, engine: &E) -> Option<BoundingBox> {
        match *self {
            Landscape::Raster { raster, .. } => Some(raster.extent()),
            _ => self.layer().and_then(|l| layer_bounds(engine, l)),
        }
    }
}

/// Run-scoped settings
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Integer field holding the grid's zone ids
    pub grid_id_field: String,
    pub category_field: Option<String>,
    pub null_policy: NullPolicy,
    /// Replaces the prefix derived from the category field or layer name
    pub prefix: Option<String>,
    pub relief: ReliefParams,
}

impl RunConfig {
    pub fn new(grid_id_field: impl Into<String>) -> Self {
        Self {
            grid_id_field: grid_id_field.into(),
            ..Default::default()
        }
    }

    pub fn with_category(mut self, field: impl Into<String>) -> Self {
        self.category_field = Some(field.into());
        self
    }

    pub fn with_null_policy(mut self, policy: NullPolicy) -> Self {
        self.null_policy = policy;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub metric: Metric,
    pub schema: OutputSchema,
    /// One row per zone, in grid order
    pub aggregates: Vec<ZoneAggregate>,
    pub scaling: Scaling,
}

/// Compute `metric` for every zone of `grid` and add its raw and
/// standardized columns to the grid.
///
/// All validation happens before the grid is touched. Transient columns are
/// removed on every exit path.
pub fn run<E: GeometryEngine>(
    engine: &E,
    metric: Metric,
    landscape: Landscape<'_>,
    grid: &mut Layer,
    config: &RunConfig,
) -> Result<RunReport> {
    let (schema, zones) = validate(engine, metric, &landscape, grid, config)?;
    info!(
        "Computing {} for {} zones of '{}' from '{}'",
        metric,
        zones.len(),
        grid.name(),
        landscape.name()
    );

    let mut fields = WorkingFields::open(grid, &zones)?;

    let mut aggregates = compute(engine, metric, &landscape, &zones, config)?;
    let scaling = standardize(&mut aggregates, config.null_policy);
    debug!("Standardized with {:?} ({})", scaling, config.null_policy);

    let matched = fields.write_results(&schema, &aggregates)?;
    info!(
        "Joined {} and {} onto {} zones",
        schema.raw_name, schema.std_name, matched
    );

    Ok(RunReport {
        metric,
        schema,
        aggregates,
        scaling,
    })
}

fn compute<E: GeometryEngine>(
    engine: &E,
    metric: Metric,
    landscape: &Landscape<'_>,
    zones: &ZoneIndex,
    config: &RunConfig,
) -> Result<Vec<ZoneAggregate>> {
    let ids = zones.ids();
    let category = config.category_field.as_deref();

    match (metric, *landscape) {
        (Metric::PolygonCategoryCount, Landscape::Polygons(layer)) => {
            let (features, polygons) = polygons_of(layer)?;
            let keys: Vec<Option<String>> = features
                .iter()
                .map(|&fi| category_of(layer, fi, category))
                .collect();
            let groups = engine.dissolve_by_key(&polygons, &keys)?;
            debug!("Dissolved {} features into {} categories", polygons.len(), groups.len());

            let merged: Vec<Geometry<f64>> = groups.iter().map(|(_, g)| g.clone().into()).collect();
            let observations = joined(engine, zones, &merged, |gi| Some(groups[gi].0.clone()))?;
            Ok(aggregate(&observations, &ids, AggregateMode::CategoryCount))
        }

        (Metric::PolygonElementCount | Metric::ShannonDiversity, Landscape::Polygons(layer)) => {
            let (features, polygons) = polygons_of(layer)?;
            let fragments = engine.intersect(zones, &polygons)?;
            let observations: Vec<CategoryObservation> = fragments
                .iter()
                .filter_map(|f| {
                    let zone = zones.zone(f.zone)?;
                    let cat = category_of(layer, features[f.feature], category);
                    Some(CategoryObservation::new(zone.id, cat, f.area))
                })
                .collect();

            let mode = if metric == Metric::ShannonDiversity {
                AggregateMode::Shannon
            } else {
                AggregateMode::ElementCount
            };
            Ok(aggregate(&observations, &ids, mode))
        }

        (Metric::TotalLength, Landscape::Lines(layer)) => {
            let lines = lines_of(layer)?;
            let pieces = engine.clip_lines(zones, &lines)?;

            let mut per_zone: BTreeMap<usize, Vec<_>> = BTreeMap::new();
            for piece in pieces {
                per_zone.entry(piece.zone).or_default().extend(piece.lines.0);
            }
            let observations: Vec<CategoryObservation> = per_zone
                .into_iter()
                .filter_map(|(zi, parts)| {
                    let dissolved = engine.dissolve_lines(&MultiLineString::new(parts));
                    let zone = zones.zone(zi)?;
                    Some(CategoryObservation::new(zone.id, None, engine.length(&dissolved)))
                })
                .collect();
            Ok(aggregate(&observations, &ids, AggregateMode::TotalMeasure))
        }

        (Metric::PointCategoryCount, Landscape::Points(layer)) => {
            let (features, points) = points_of(layer)?;
            let nearest = engine.nearest_zone(zones, &points)?;
            let observations: Vec<CategoryObservation> = nearest
                .iter()
                .zip(&features)
                .filter_map(|(zi, &fi)| {
                    let zone = zones.zone((*zi)?)?;
                    Some(CategoryObservation::new(zone.id, category_of(layer, fi, category), 1.0))
                })
                .collect();
            Ok(aggregate(&observations, &ids, AggregateMode::CategoryCount))
        }

        (Metric::PointElementCount | Metric::UnitEntropy, Landscape::Points(layer)) => {
            let (features, points) = points_of(layer)?;
            let geometries: Vec<Geometry<f64>> = points.into_iter().map(Geometry::Point).collect();
            let observations = joined(engine, zones, &geometries, |gi| category_of(layer, features[gi], category))?;

            let mode = if metric == Metric::UnitEntropy {
                AggregateMode::UnitEntropy
            } else {
                AggregateMode::ElementCount
            };
            Ok(aggregate(&observations, &ids, mode))
        }

        (Metric::RasterStdDev, Landscape::Raster { raster, .. }) => {
            let values = engine.zonal_raster_stat(zones, raster, ZonalStatistic::StdDev)?;
            Ok(zip_aggregates(&ids, values))
        }

        (Metric::CircularStdDev, Landscape::Raster { raster, .. }) => {
            let values = zonal_circular_std_dev(engine, zones, raster)?;
            Ok(zip_aggregates(&ids, values))
        }

        (Metric::VerticalRelief, Landscape::Raster { raster, .. }) => {
            let relief = vertical_relief(engine, zones, raster, &config.relief)?;
            Ok(relief
                .into_iter()
                .map(|r| ZoneAggregate::new(r.zone_id, r.rm))
                .collect())
        }

        (metric, landscape) => Err(Error::Configuration(format!(
            "{} cannot be computed from a {}",
            metric,
            landscape.kind()
        ))),
    }
}

fn zip_aggregates(ids: &[ZoneId], values: Vec<Option<f64>>) -> Vec<ZoneAggregate> {
    ids.iter()
        .zip(values)
        .map(|(&id, v)| ZoneAggregate::new(id, v))
        .collect()
}

/// One observation per (zone, geometry) pair that intersects
fn joined<E, F>(
    engine: &E,
    zones: &ZoneIndex,
    geometries: &[Geometry<f64>],
    category: F,
) -> Result<Vec<CategoryObservation>>
where
    E: GeometryEngine,
    F: Fn(usize) -> Option<String>,
{
    let hits = engine.spatial_join(zones, geometries)?;
    Ok(zones
        .iter()
        .zip(hits)
        .flat_map(|(zone, hits)| {
            hits.into_iter()
                .map(|gi| CategoryObservation::new(zone.id, category(gi), 1.0))
                .collect::<Vec<_>>()
        })
        .collect())
}

fn category_of(layer: &Layer, feature: usize, field: Option<&str>) -> Option<String> {
    layer.value(feature, field?)?.key()
}

fn wrong_geometry(layer: &Layer, index: usize, expected: &str) -> Error {
    Error::GeometryEngine(format!(
        "feature {} of '{}' is not a {} geometry",
        index,
        layer.name(),
        expected
    ))
}

/// Polygon features with their feature positions; features without
/// geometry are skipped
fn polygons_of(layer: &Layer) -> Result<(Vec<usize>, Vec<MultiPolygon<f64>>)> {
    let mut features = Vec::new();
    let mut polygons = Vec::new();
    for (i, feature) in layer.iter().enumerate() {
        let Some(g) = &feature.geometry else { continue };
        polygons.push(to_multipolygon(g).ok_or_else(|| wrong_geometry(layer, i, "polygon"))?);
        features.push(i);
    }
    Ok((features, polygons))
}

fn lines_of(layer: &Layer) -> Result<Vec<MultiLineString<f64>>> {
    layer
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.geometry.as_ref().map(|g| (i, g)))
        .map(|(i, g)| to_multilinestring(g).ok_or_else(|| wrong_geometry(layer, i, "line")))
        .collect()
}

/// Points with the position of the feature each came from; multipoints
/// contribute every member
fn points_of(layer: &Layer) -> Result<(Vec<usize>, Vec<Point<f64>>)> {
    let mut features = Vec::new();
    let mut points = Vec::new();
    for (i, feature) in layer.iter().enumerate() {
        match &feature.geometry {
            None => {}
            Some(Geometry::Point(p)) => {
                features.push(i);
                points.push(*p);
            }
            Some(Geometry::MultiPoint(mp)) => {
                for p in &mp.0 {
                    features.push(i);
                    points.push(*p);
                }
            }
            Some(_) => return Err(wrong_geometry(layer, i, "point")),
        }
    }
    Ok((features, points))
}
