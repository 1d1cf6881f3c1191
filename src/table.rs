//! Per-scenario attribute table derived from feature properties.

use std::{collections::BTreeMap, path::Path};

use serde_json::{Map, Value};

use crate::config::TableSchema;
use crate::error::{Error, Result};
use crate::io::{csv, FeatureCollection};

/// One table row: region name, value as written in the source, display color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRow {
    pub name: String,
    pub value: String,
    pub color: String,
}

/// Rows sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTable {
    rows: Vec<AttributeRow>,
}

impl AttributeTable {
    #[inline] pub fn rows(&self) -> &[AttributeRow] { &self.rows }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Write as CSV with the schema's headers; returns the row count.
    pub fn write(&self, schema: &TableSchema, path: &Path) -> Result<usize> {
        csv::write_table(self, schema, path)?;
        Ok(self.len())
    }
}

/// Build the attribute table for one scenario.
///
/// Features without a name or a value are skipped. A missing classification
/// counts as 0; `overrides` replaces the stored classification by region name.
pub fn build_table(
    collection: &FeatureCollection,
    schema: &TableSchema,
    overrides: &BTreeMap<String, i64>,
) -> Result<AttributeTable> {
    let empty = Map::new();
    let mut rows = Vec::with_capacity(collection.len());

    for idx in 0..collection.len() {
        let props = collection.properties(idx).unwrap_or(&empty);

        let Some(name) = props.get(&schema.name_field).and_then(scalar_text) else { continue };
        let Some(value) = props.get(&schema.value_field).and_then(scalar_text) else { continue };

        let class = match overrides.get(&name) {
            Some(&class) => class,
            None => match props.get(&schema.class_field) {
                Some(raw) => parse_class(raw)
                    .map_err(|message| Error::Attribute { feature: idx, message })?,
                None => 0,
            },
        };

        let color = if class == 1 { &schema.class_one_color } else { &schema.default_color };
        rows.push(AttributeRow { name, value, color: color.clone() });
    }

    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(AttributeTable { rows })
}

/// Text of a scalar property; null, empty strings and containers read as absent.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Integer classification: numbers truncate, booleans map to 0/1, null reads as 0.
fn parse_class(value: &Value) -> std::result::Result<i64, String> {
    match value {
        Value::Null => Ok(0),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::Number(n) => n.as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .ok_or_else(|| format!("classification {n} is out of range")),
        Value::String(s) => s.trim().parse::<i64>()
            .map_err(|_| format!("classification {s:?} is not an integer")),
        other => Err(format!("classification {other} is not a scalar")),
    }
}
