//! IO module for format-specific reading and writing operations.
//!
//! # Format Modules
//!
//! - `geojson` - GeoJSON feature collections (input geometry and cartogram output)
//! - `csv` - CSV attribute tables consumed by the cartogram tool
//! - `svg` - SVG rendering fixes applied after a cartogram run

pub(crate) mod csv;
pub mod geojson;
pub mod svg;

pub use geojson::{FeatureCollection, Shape};
