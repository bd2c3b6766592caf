//! CSV export of the Top-K table with human-readable headers.

use crate::error::{InsightsError, Result, ResultExt};
use crate::types::{
    CHARGING_STATIONS, CITY, MEDIAN_INCOME, POPULATION, PREDICTED_SALES, STATE, ZIP,
};
use crate::utils::f64_values;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Exported columns as (dataset column, CSV header), in output order.
pub const EXPORT_COLUMNS: [(&str, &str); 7] = [
    (ZIP, "ZIP"),
    (CITY, "City"),
    (STATE, "State"),
    (POPULATION, "Population"),
    (MEDIAN_INCOME, "Median income"),
    (CHARGING_STATIONS, "Charging stations"),
    (PREDICTED_SALES, "Predicted sales (12m)"),
];

/// Render a Top-K frame as UTF-8 CSV bytes with renamed headers.
///
/// Predicted sales are written as integers when every value is whole.
pub fn top_zips_csv(top: &DataFrame) -> Result<Vec<u8>> {
    let whole_sales = f64_values(top, PREDICTED_SALES)?
        .into_iter()
        .flatten()
        .all(|v| v.fract() == 0.0);

    let exprs: Vec<Expr> = EXPORT_COLUMNS
        .iter()
        .map(|&(column, header)| {
            let expr = col(column);
            if column == PREDICTED_SALES && whole_sales {
                expr.cast(DataType::Int64).alias(header)
            } else {
                expr.alias(header)
            }
        })
        .collect();

    let mut table = top
        .clone()
        .lazy()
        .select(exprs)
        .collect()
        .context("Selecting export columns")?;

    let mut buffer = Vec::new();
    CsvWriter::new(&mut buffer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut table)
        .map_err(|e| InsightsError::Export(e.to_string()))?;

    Ok(buffer)
}

/// Write the Top-K CSV into `dir`, creating it if needed.
pub fn write_top_zips(top: &DataFrame, dir: &Path, file_name: &str) -> Result<PathBuf> {
    let bytes = top_zips_csv(top)?;

    fs::create_dir_all(dir)
        .context(format!("Creating export directory {}", dir.display()))?;
    let path = dir.join(file_name);
    fs::write(&path, bytes).context(format!("Writing {}", path.display()))?;

    info!("Top ZIPs exported: {} ({} rows)", path.display(), top.height());
    Ok(path)
}
