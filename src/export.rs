use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::filter::{apply_filters, FilterSelection};
use polars::prelude::*;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write the filtered rows as CSV (header included) and return the row count
pub fn write_filtered_csv<W: Write>(
    dataset: &Dataset,
    selection: &FilterSelection,
    writer: &mut W,
) -> Result<usize> {
    let mut subset = apply_filters(dataset, selection)?;
    CsvWriter::new(writer)
        .include_header(true)
        .finish(&mut subset)
        .map_err(|e| DashboardError::Polars(format!("Failed to write CSV: {}", e)))?;
    Ok(subset.height())
}

pub fn export_filtered_csv(
    dataset: &Dataset,
    selection: &FilterSelection,
    output: &Path,
) -> Result<usize> {
    let mut file = std::fs::File::create(output)?;
    let rows = write_filtered_csv(dataset, selection, &mut file)?;
    info!("Exported {} rows to {}", rows, output.display());
    Ok(rows)
}
