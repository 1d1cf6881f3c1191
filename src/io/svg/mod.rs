//! SVG artifact rewriting.

mod fill;

pub use fill::*;
