//! Features and attribute values

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Numeric value, `None` for null, booleans and non-numeric text
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::String(s) => s.trim().parse().ok(),
            AttributeValue::Null | AttributeValue::Bool(_) => None,
        }
    }

    /// Integral value; floats must have no fractional part
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(i) => Some(*i),
            AttributeValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            AttributeValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Key used for grouping and joining; integral floats match integers
    pub fn key(&self) -> Option<String> {
        match self {
            AttributeValue::Null => None,
            other => Some(match other.as_i64() {
                Some(i) if !matches!(other, AttributeValue::String(_)) => i.to_string(),
                _ => other.to_string(),
            }),
        }
    }

    /// Optional float, null for `None` and non-finite values
    pub fn from_f64(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => AttributeValue::Float(v),
            _ => AttributeValue::Null,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "<null>"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::String(v.to_string())
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, Default)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: HashMap<String, AttributeValue>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: HashMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set_property(key, value.into());
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}
