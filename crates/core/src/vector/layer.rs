//! Layers, schemas and attribute-table primitives
//!
//! Field names are matched case-insensitively, as in a geodatabase. Every
//! mutation keeps the schema and the per-feature property maps in sync.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature};

/// Storage type of an attribute field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Integer,
    Double,
    Text,
    Boolean,
}

/// Definition of one attribute field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub alias: Option<String>,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            alias: None,
            kind,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Ordered set of field definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Case-insensitive lookup
    pub fn find(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// A named collection of features sharing one schema
#[derive(Debug, Clone, Default)]
pub struct Layer {
    name: String,
    schema: Schema,
    features: Vec<Feature>,
}

impl Layer {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            features: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Append a feature; properties are re-keyed to the schema's spelling
    /// and fields missing from the schema are dropped.
    pub fn push(&mut self, feature: Feature) {
        let Feature { geometry, properties } = feature;
        let mut normalized = HashMap::with_capacity(self.schema.fields.len());
        for (key, value) in properties {
            if let Some(def) = self.schema.find(&key) {
                normalized.insert(def.name.clone(), value);
            }
        }
        for def in &self.schema.fields {
            normalized.entry(def.name.clone()).or_insert(AttributeValue::Null);
        }
        self.features.push(Feature {
            geometry,
            properties: normalized,
        });
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.schema.contains(name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.schema.find(name)
    }

    /// Attribute of one feature, case-insensitive on the field name
    pub fn value(&self, index: usize, field: &str) -> Option<&AttributeValue> {
        let def = self.schema.find(field)?;
        self.features.get(index)?.properties.get(&def.name)
    }

    /// Add a field filled with nulls
    pub fn add_field(&mut self, def: FieldDef) -> Result<()> {
        if self.schema.contains(&def.name) {
            return Err(Error::Configuration(format!(
                "field '{}' already exists in layer '{}'",
                def.name, self.name
            )));
        }
        for feature in &mut self.features {
            feature.properties.insert(def.name.clone(), AttributeValue::Null);
        }
        self.schema.fields.push(def);
        Ok(())
    }

    /// Remove a field and its values
    pub fn delete_field(&mut self, name: &str) -> Result<()> {
        let pos = self.schema.position(name).ok_or_else(|| {
            Error::Configuration(format!("field '{}' not found in layer '{}'", name, self.name))
        })?;
        let def = self.schema.fields.remove(pos);
        for feature in &mut self.features {
            feature.properties.remove(&def.name);
        }
        Ok(())
    }

    /// Rename a field, optionally setting a new alias
    pub fn rename_field(&mut self, name: &str, new_name: &str, alias: Option<&str>) -> Result<()> {
        let pos = self.schema.position(name).ok_or_else(|| {
            Error::Configuration(format!("field '{}' not found in layer '{}'", name, self.name))
        })?;
        let clashes = self
            .schema
            .position(new_name)
            .is_some_and(|other| other != pos);
        if clashes {
            return Err(Error::Configuration(format!(
                "cannot rename '{}' to '{}': field exists in layer '{}'",
                name, new_name, self.name
            )));
        }

        let old = std::mem::replace(&mut self.schema.fields[pos].name, new_name.to_string());
        if let Some(alias) = alias {
            self.schema.fields[pos].alias = Some(alias.to_string());
        }
        for feature in &mut self.features {
            if let Some(v) = feature.properties.remove(&old) {
                feature.properties.insert(new_name.to_string(), v);
            }
        }
        Ok(())
    }

    /// Set one attribute value
    pub fn set_value(&mut self, index: usize, field: &str, value: AttributeValue) -> Result<()> {
        let name = self
            .schema
            .find(field)
            .map(|d| d.name.clone())
            .ok_or_else(|| {
                Error::Configuration(format!("field '{}' not found in layer '{}'", field, self.name))
            })?;
        let len = self.features.len();
        let feature = self.features.get_mut(index).ok_or(Error::IndexOutOfBounds {
            row: index,
            col: 0,
            rows: len,
            cols: 1,
        })?;
        feature.properties.insert(name, value);
        Ok(())
    }

    /// Copy `fields` from `source` onto this layer, matching `key` against
    /// `source_key`. Features without a matching row receive nulls.
    ///
    /// Returns the number of features that matched a row.
    pub fn join_fields(
        &mut self,
        key: &str,
        source: &Table,
        source_key: &str,
        fields: &[&str],
    ) -> Result<usize> {
        let key_name = self
            .schema
            .find(key)
            .map(|d| d.name.clone())
            .ok_or_else(|| {
                Error::Configuration(format!("join key '{}' not found in layer '{}'", key, self.name))
            })?;

        let defs: Vec<FieldDef> = fields
            .iter()
            .map(|f| {
                source.schema.find(f).cloned().ok_or_else(|| {
                    Error::Configuration(format!("join field '{}' not found in source table", f))
                })
            })
            .collect::<Result<_>>()?;

        if let Some(existing) = defs.iter().find(|d| self.schema.contains(&d.name)) {
            return Err(Error::Configuration(format!(
                "join field '{}' already exists in layer '{}'",
                existing.name, self.name
            )));
        }

        let lookup = source.index_by(source_key)?;

        let mut matched = 0;
        for feature in &mut self.features {
            let row = feature
                .properties
                .get(&key_name)
                .and_then(AttributeValue::key)
                .and_then(|k| lookup.get(&k))
                .map(|&i| &source.rows[i]);
            if row.is_some() {
                matched += 1;
            }
            for def in &defs {
                let value = row
                    .and_then(|r| r.get(&def.name))
                    .cloned()
                    .unwrap_or_default();
                feature.properties.insert(def.name.clone(), value);
            }
        }

        self.schema.fields.extend(defs);
        Ok(matched)
    }
}

/// Attribute rows without geometry
#[derive(Debug, Clone, Default)]
pub struct Table {
    schema: Schema,
    rows: Vec<HashMap<String, AttributeValue>>,
}

impl Table {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row given in schema order
    pub fn push_row(&mut self, values: Vec<AttributeValue>) -> Result<()> {
        if values.len() != self.schema.fields.len() {
            return Err(Error::Other(format!(
                "row has {} values, table has {} fields",
                values.len(),
                self.schema.fields.len()
            )));
        }
        let row = self
            .schema
            .fields
            .iter()
            .map(|d| d.name.clone())
            .zip(values)
            .collect();
        self.rows.push(row);
        Ok(())
    }

    pub fn value(&self, row: usize, field: &str) -> Option<&AttributeValue> {
        let def = self.schema.find(field)?;
        self.rows.get(row)?.get(&def.name)
    }

    fn index_by(&self, key: &str) -> Result<HashMap<String, usize>> {
        let def = self.schema.find(key).ok_or_else(|| {
            Error::Configuration(format!("join key '{}' not found in source table", key))
        })?;
        Ok(self
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row.get(&def.name).and_then(AttributeValue::key).map(|k| (k, i)))
            .collect())
    }
}
