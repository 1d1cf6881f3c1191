//! CSV writing operations.

use std::path::Path;

use polars::{frame::DataFrame, io::SerWriter, prelude::{CsvWriter, NamedFrom}, series::Series};

use crate::common::{finalize_write, open_for_write};
use crate::config::TableSchema;
use crate::error::Result;
use crate::table::AttributeTable;

/// Write a DataFrame to a CSV file (header row, no index column).
pub(crate) fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut pending = open_for_write(path)?;
    CsvWriter::new(&mut pending)
        .include_header(true)
        .finish(df)?;
    finalize_write(pending)
}

/// Convert an attribute table into a three-column DataFrame named after the schema headers.
pub(crate) fn table_to_df(table: &AttributeTable, schema: &TableSchema) -> Result<DataFrame> {
    let rows = table.rows();
    let names = rows.iter().map(|row| row.name.as_str()).collect::<Vec<_>>();
    let values = rows.iter().map(|row| row.value.as_str()).collect::<Vec<_>>();
    let colors = rows.iter().map(|row| row.color.as_str()).collect::<Vec<_>>();

    Ok(DataFrame::new(vec![
        Series::new(schema.name_header.as_str().into(), names).into(),
        Series::new(schema.value_header.as_str().into(), values).into(),
        Series::new(schema.color_header.as_str().into(), colors).into(),
    ])?)
}

/// Write an attribute table as CSV in row order.
pub(crate) fn write_table(table: &AttributeTable, schema: &TableSchema, path: &Path) -> Result<()> {
    write_csv(&mut table_to_df(table, schema)?, path)
}
