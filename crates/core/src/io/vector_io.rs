//! GeoJSON reading and writing for vector layers
//!
//! The attribute schema is inferred from the property values: integers and
//! floats in the same field widen to `Double`, anything mixed with text
//! becomes `Text`.

use std::fs;
use std::path::Path;

use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FieldDef, FieldKind, Layer, Schema};

/// Read a GeoJSON FeatureCollection; the layer is named after the file stem
pub fn read_layer<P: AsRef<Path>>(path: P) -> Result<Layer> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("layer")
        .to_string();
    parse_layer(&name, &text)
}

/// Parse a GeoJSON document into a named layer
pub fn parse_layer(name: &str, text: &str) -> Result<Layer> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| Error::Other(format!("GeoJSON parse error: {}", e)))?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![geojson::Feature {
            geometry: Some(g),
            ..Default::default()
        }],
    };

    let mut converted = Vec::with_capacity(features.len());
    let mut kinds: Vec<(String, Option<FieldKind>)> = Vec::new();

    for feature in features {
        let geometry = feature
            .geometry
            .map(|g| geo_types::Geometry::<f64>::try_from(g.value))
            .transpose()
            .map_err(|e| Error::GeometryEngine(format!("unsupported GeoJSON geometry: {}", e)))?;

        let mut out = Feature {
            geometry,
            ..Default::default()
        };
        for (key, value) in feature.properties.unwrap_or_default() {
            let value = from_json(value);
            let slot = match kinds.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
                Some(slot) => slot,
                None => {
                    kinds.push((key.clone(), None));
                    let last = kinds.len() - 1;
                    &mut kinds[last]
                }
            };
            slot.1 = widen(slot.1, &value);
            out.properties.insert(key, value);
        }
        converted.push(out);
    }

    let schema = Schema::new(
        kinds
            .into_iter()
            .map(|(name, kind)| FieldDef::new(name, kind.unwrap_or(FieldKind::Text)))
            .collect(),
    );

    let mut layer = Layer::new(name, schema);
    for feature in converted {
        layer.push(feature);
    }
    Ok(layer)
}

/// Write a layer as a GeoJSON FeatureCollection
pub fn write_layer<P: AsRef<Path>>(layer: &Layer, path: P) -> Result<()> {
    fs::write(path, to_geojson_string(layer)?)?;
    Ok(())
}

/// Serialize a layer to GeoJSON text
pub fn to_geojson_string(layer: &Layer) -> Result<String> {
    let features = layer
        .iter()
        .map(|f| {
            let properties: JsonObject = layer
                .schema()
                .fields()
                .iter()
                .map(|def| {
                    let v = f.properties.get(&def.name).cloned().unwrap_or_default();
                    (def.name.clone(), to_json(v))
                })
                .collect();
            geojson::Feature {
                geometry: f
                    .geometry
                    .as_ref()
                    .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
                properties: Some(properties),
                ..Default::default()
            }
        })
        .collect();

    let fc = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    serde_json::to_string(&fc).map_err(|e| Error::Other(format!("GeoJSON write error: {}", e)))
}

fn from_json(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::from_f64(n.as_f64()),
        },
        JsonValue::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

fn to_json(value: AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(b) => JsonValue::Bool(b),
        AttributeValue::Int(i) => JsonValue::from(i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        AttributeValue::String(s) => JsonValue::String(s),
    }
}

fn widen(current: Option<FieldKind>, value: &AttributeValue) -> Option<FieldKind> {
    let incoming = match value {
        AttributeValue::Null => return current,
        AttributeValue::Bool(_) => FieldKind::Boolean,
        AttributeValue::Int(_) => FieldKind::Integer,
        AttributeValue::Float(_) => FieldKind::Double,
        AttributeValue::String(_) => FieldKind::Text,
    };
    Some(match (current, incoming) {
        (None, k) => k,
        (Some(a), b) if a == b => a,
        (Some(FieldKind::Integer), FieldKind::Double) | (Some(FieldKind::Double), FieldKind::Integer) => {
            FieldKind::Double
        }
        _ => FieldKind::Text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]},
             "properties": {"ID": 1, "LITHO": "granite", "AREA": 1}},
            {"type": "Feature",
             "geometry": {"type": "Polygon", "coordinates": [[[1,0],[2,0],[2,1],[1,1],[1,0]]]},
             "properties": {"ID": 2, "LITHO": null, "AREA": 1.5}}
        ]
    }"#;

    #[test]
    fn test_parse_infers_schema() {
        let layer = parse_layer("grid", GRID).unwrap();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.field("id").unwrap().kind, FieldKind::Integer);
        assert_eq!(layer.field("AREA").unwrap().kind, FieldKind::Double);
        assert_eq!(layer.field("LITHO").unwrap().kind, FieldKind::Text);
        assert!(layer.value(1, "LITHO").unwrap().is_null());
        assert!(matches!(
            layer.features()[0].geometry,
            Some(geo_types::Geometry::Polygon(_))
        ));
    }

    #[test]
    fn test_write_then_read_file() {
        let layer = parse_layer("grid", GRID).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.geojson");
        write_layer(&layer, &path).unwrap();

        let back = read_layer(&path).unwrap();
        assert_eq!(back.name(), "grid");
        assert_eq!(back.value(0, "LITHO"), Some(&AttributeValue::from("granite")));
        assert_eq!(back.value(1, "AREA"), Some(&AttributeValue::Float(1.5)));
    }
}
