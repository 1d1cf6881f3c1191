//! GeoJSON FeatureCollection reading and writing.
//!
//! The collection is held as raw JSON so that every member other than a
//! rewritten `geometry` survives a read/write cycle untouched.

mod shape;

use std::{fs, path::Path};

use serde_json::{Map, Value};

pub use shape::Shape;

use crate::common::{finalize_write, open_for_write};
use crate::error::{Error, Result};

/// An ordered sequence of features plus whatever top-level members the file carried.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    root: Value,
}

impl FeatureCollection {
    /// Wrap a parsed GeoJSON document. The root must be an object with a `features` array.
    pub fn from_value(root: Value) -> Result<Self> {
        match root.get("features") {
            Some(Value::Array(features)) => {
                if let Some(idx) = features.iter().position(|f| !f.is_object()) {
                    return Err(Error::MalformedCollection(format!("feature {idx} is not an object")));
                }
                Ok(Self { root })
            }
            _ => Err(Error::MalformedCollection("missing \"features\" array".into())),
        }
    }

    /// Read a GeoJSON file.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
        let root = serde_json::from_slice(&bytes).map_err(|e| Error::json(path, e))?;
        Self::from_value(root)
    }

    /// Write the collection to `path`, replacing it atomically.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut pending = open_for_write(path)?;
        serde_json::to_writer(&mut pending, &self.root).map_err(|e| Error::json(path, e))?;
        finalize_write(pending)
    }

    #[inline] pub fn as_value(&self) -> &Value { &self.root }

    #[inline] pub fn len(&self) -> usize { self.features().len() }

    #[inline] pub fn is_empty(&self) -> bool { self.features().is_empty() }

    fn features(&self) -> &[Value] {
        self.root.get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Parse the geometry of feature `idx`.
    pub fn shape(&self, idx: usize) -> Result<Shape> {
        let geometry = self.features().get(idx)
            .and_then(|feature| feature.get("geometry"))
            .ok_or_else(|| Error::GeometryParse { feature: idx, message: "missing geometry".into() })?;
        Shape::from_geojson(geometry)
            .map_err(|message| Error::GeometryParse { feature: idx, message })
    }

    /// Parse every geometry, failing on the first malformed one.
    pub fn shapes(&self) -> Result<Vec<Shape>> {
        (0..self.len()).map(|idx| self.shape(idx)).collect()
    }

    /// Property mapping of feature `idx`; a missing or null `properties` member reads as `None`.
    pub fn properties(&self, idx: usize) -> Option<&Map<String, Value>> {
        self.features().get(idx)?.get("properties")?.as_object()
    }

    /// Replace the geometry of feature `idx`, leaving its other members in place.
    pub(crate) fn set_shape(&mut self, idx: usize, shape: &Shape) {
        let feature = self.root.get_mut("features")
            .and_then(|features| features.get_mut(idx))
            .and_then(Value::as_object_mut);
        if let Some(feature) = feature {
            feature.insert("geometry".to_string(), shape.to_geojson());
        }
    }
}
