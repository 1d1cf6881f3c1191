//! CSV format writing for derived attribute tables.

mod write;

pub(crate) use write::*;
