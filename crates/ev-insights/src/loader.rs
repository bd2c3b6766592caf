//! Dataset loading.
//!
//! Both CSV files are read once at startup into a [`Datasets`] handle. The
//! handle is immutable; callers share it behind an `Arc` and every filter
//! produces a new frame.
//!
//! Columns are read as text first so ZIP codes keep their leading zeros,
//! then numeric columns are strictly cast to their fixed dtypes. A
//! non-empty cell that does not parse as a number fails the load, as does
//! a fractional or out-of-range value in an integer column. `NaN` cells
//! are read as missing.

use crate::config::DashboardConfig;
use crate::error::{InsightsError, Result};
use crate::types::{
    AVG_SENTIMENT, CHARGING_STATIONS, CITY, CONCERN, EV_SHARE, LAT, LON, MEDIAN_INCOME,
    MENTION_COUNT, POPULATION, PREDICTED_SALES, STATE, ZIP,
};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// The value type a dataset column is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
}

/// The two datasets the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Geo,
    Concerns,
}

impl DatasetKind {
    pub fn name(&self) -> &'static str {
        match self {
            DatasetKind::Geo => "geo",
            DatasetKind::Concerns => "concerns",
        }
    }

    /// Required columns, in output order.
    pub fn columns(&self) -> &'static [(&'static str, ColumnKind)] {
        match self {
            DatasetKind::Geo => &[
                (ZIP, ColumnKind::Text),
                (CITY, ColumnKind::Text),
                (STATE, ColumnKind::Text),
                (LAT, ColumnKind::Float),
                (LON, ColumnKind::Float),
                (POPULATION, ColumnKind::Integer),
                (MEDIAN_INCOME, ColumnKind::Integer),
                (CHARGING_STATIONS, ColumnKind::Integer),
                (EV_SHARE, ColumnKind::Float),
                (PREDICTED_SALES, ColumnKind::Float),
            ],
            DatasetKind::Concerns => &[
                (STATE, ColumnKind::Text),
                (CITY, ColumnKind::Text),
                (CONCERN, ColumnKind::Text),
                (MENTION_COUNT, ColumnKind::Integer),
                (AVG_SENTIMENT, ColumnKind::Float),
            ],
        }
    }
}

/// The loaded, schema-normalized datasets for one process.
#[derive(Debug, Clone)]
pub struct Datasets {
    geo: DataFrame,
    concerns: DataFrame,
}

impl Datasets {
    /// Load both datasets from the paths in `config`.
    pub fn load(config: &DashboardConfig) -> Result<Self> {
        Self::load_from_paths(&config.geo_path, &config.concerns_path)
    }

    /// Load both datasets from explicit CSV paths.
    pub fn load_from_paths(geo_path: &Path, concerns_path: &Path) -> Result<Self> {
        let geo = read_csv(DatasetKind::Geo, geo_path)?;
        let concerns = read_csv(DatasetKind::Concerns, concerns_path)?;
        Self::from_frames(geo, concerns)
    }

    /// Build the handle from frames that are already in memory.
    ///
    /// The frames go through the same column validation and casting as
    /// files do; extra columns are dropped.
    pub fn from_frames(geo: DataFrame, concerns: DataFrame) -> Result<Self> {
        let geo = normalize_frame(DatasetKind::Geo, geo)?;
        let concerns = normalize_frame(DatasetKind::Concerns, concerns)?;

        info!(
            "Datasets ready: {} geo rows, {} concern rows",
            geo.height(),
            concerns.height()
        );

        Ok(Self { geo, concerns })
    }

    pub fn geo(&self) -> &DataFrame {
        &self.geo
    }

    pub fn concerns(&self) -> &DataFrame {
        &self.concerns
    }
}

/// Read a dataset CSV with every column as text.
fn read_csv(kind: DatasetKind, path: &Path) -> Result<DataFrame> {
    info!("Loading {} dataset from: {}", kind.name(), path.display());

    if !path.exists() {
        return Err(InsightsError::DataLoad {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }

    let load_error = |e: PolarsError| InsightsError::DataLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(load_error)?
        .finish()
        .map_err(load_error)?;

    debug!("Read {} dataset: {:?}", kind.name(), df.shape());
    Ok(df)
}

/// Check required columns, cast them to their fixed dtypes and drop the rest.
fn normalize_frame(kind: DatasetKind, mut df: DataFrame) -> Result<DataFrame> {
    for &(name, column_kind) in kind.columns() {
        let series = match df.column(name) {
            Ok(column) => column.as_materialized_series().clone(),
            Err(_) => {
                return Err(InsightsError::MissingColumn {
                    dataset: kind.name().to_string(),
                    column: name.to_string(),
                });
            }
        };

        let malformed = |e: PolarsError| InsightsError::MalformedColumn {
            dataset: kind.name().to_string(),
            column: name.to_string(),
            reason: e.to_string(),
        };

        let normalized = match column_kind {
            ColumnKind::Text => series.cast(&DataType::String)?,
            ColumnKind::Float => {
                finite_or_null(&series.strict_cast(&DataType::Float64).map_err(malformed)?)?
            }
            // Parsed through f64 so "95000.0" is accepted
            ColumnKind::Integer => whole_numbers(
                kind,
                &series.strict_cast(&DataType::Float64).map_err(malformed)?,
            )?,
        };

        df.with_column(normalized)?;
    }

    let names: Vec<&str> = kind.columns().iter().map(|(name, _)| *name).collect();
    Ok(df.select(names)?)
}

/// NaN and infinite cells become nulls, so sums, means and rankings skip them.
fn finite_or_null(floats: &Series) -> Result<Series> {
    let cleaned: Float64Chunked = floats
        .f64()?
        .iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(cleaned.with_name(floats.name().clone()).into_series())
}

/// 2^63: the first f64 past `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Convert a float column to `Int64`, treating NaN as missing.
///
/// A fractional, infinite or out-of-range value is a malformed cell.
fn whole_numbers(kind: DatasetKind, floats: &Series) -> Result<Series> {
    let mut values: Vec<Option<i64>> = Vec::with_capacity(floats.len());

    for value in floats.f64()?.iter() {
        match value {
            None => values.push(None),
            Some(v) if v.is_nan() => values.push(None),
            Some(v) if v.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(&v) => {
                values.push(Some(v as i64))
            }
            Some(v) => {
                return Err(InsightsError::MalformedColumn {
                    dataset: kind.name().to_string(),
                    column: floats.name().to_string(),
                    reason: format!("{} is not a whole number in the Int64 range", v),
                });
            }
        }
    }

    Ok(Series::new(floats.name().clone(), values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo_text_frame() -> DataFrame {
        df!(
            "zip" => ["02108", "78701"],
            "city" => ["Boston", "Austin"],
            "state" => ["MA", "TX"],
            "lat" => ["42.3576", "30.2711"],
            "lon" => ["-71.0636", "-97.7437"],
            "population" => ["4000", "12000"],
            "median_income" => ["120000", "95000.0"],
            "charging_stations" => ["45", "50"],
            "ev_share" => ["0.14", "0.08"],
            "predicted_ev_sales_next_12m" => ["75", "120"],
            "notes" => ["coastal", "capital"],
        )
        .unwrap()
    }

    fn concerns_text_frame() -> DataFrame {
        df!(
            "state" => ["TX"],
            "city" => ["Austin"],
            "concern" => ["Range anxiety"],
            "mention_count" => ["80"],
            "avg_sentiment" => ["-0.3"],
        )
        .unwrap()
    }

    #[test]
    fn test_from_frames_normalizes_dtypes() {
        let data = Datasets::from_frames(geo_text_frame(), concerns_text_frame()).unwrap();
        let geo = data.geo();

        assert_eq!(geo.width(), 10);
        assert!(geo.column("notes").is_err());
        assert_eq!(geo.column(ZIP).unwrap().dtype(), &DataType::String);
        assert_eq!(geo.column(MEDIAN_INCOME).unwrap().dtype(), &DataType::Int64);
        assert_eq!(geo.column(EV_SHARE).unwrap().dtype(), &DataType::Float64);
        assert_eq!(
            data.concerns().column(MENTION_COUNT).unwrap().dtype(),
            &DataType::Int64
        );
    }

    #[test]
    fn test_zip_keeps_leading_zero() {
        let data = Datasets::from_frames(geo_text_frame(), concerns_text_frame()).unwrap();
        let zips = crate::utils::str_values(data.geo(), ZIP).unwrap();
        assert_eq!(zips[0].as_deref(), Some("02108"));
    }

    #[test]
    fn test_missing_column_rejected() {
        let geo = geo_text_frame().drop(EV_SHARE).unwrap();
        let err = Datasets::from_frames(geo, concerns_text_frame()).unwrap_err();

        assert_eq!(err.error_code(), "MISSING_COLUMN");
        assert!(err.to_string().contains("ev_share"));
        assert!(err.is_data_load_error());
    }

    #[test]
    fn test_non_numeric_cell_rejected() {
        let concerns = df!(
            "state" => ["TX"],
            "city" => ["Austin"],
            "concern" => ["Range anxiety"],
            "mention_count" => ["eighty"],
            "avg_sentiment" => ["-0.3"],
        )
        .unwrap();
        let err = Datasets::from_frames(geo_text_frame(), concerns).unwrap_err();

        assert_eq!(err.error_code(), "MALFORMED_COLUMN");
        assert!(err.to_string().contains("mention_count"));
    }

    fn geo_with(column: &str, values: [&str; 2]) -> DataFrame {
        let mut geo = geo_text_frame();
        geo.with_column(Series::new(column.into(), values)).unwrap();
        geo
    }

    #[test]
    fn test_nan_cells_become_missing() {
        let mut geo = geo_text_frame();
        geo.with_column(Series::new(EV_SHARE.into(), ["NaN", "0.08"]))
            .unwrap();
        geo.with_column(Series::new(PREDICTED_SALES.into(), ["NaN", "120"]))
            .unwrap();
        let data = Datasets::from_frames(geo, concerns_text_frame()).unwrap();

        let metrics = crate::aggregate::summary_metrics(data.geo()).unwrap();
        assert_eq!(metrics.total_predicted_sales, 120.0);
        assert_eq!(metrics.avg_ev_share, Some(0.08));

        let top = crate::aggregate::top_zips(&crate::aggregate::top_k(data.geo(), 3).unwrap())
            .unwrap();
        assert_eq!(top[0].zip, "78701");
        assert_eq!(top[1].predicted_sales, None);
    }

    #[test]
    fn test_nan_in_integer_column_is_missing() {
        let data =
            Datasets::from_frames(geo_with(POPULATION, ["NaN", "12000"]), concerns_text_frame())
                .unwrap();
        let populations = crate::utils::i64_values(data.geo(), POPULATION).unwrap();
        assert_eq!(populations, vec![None, Some(12000)]);
    }

    #[test]
    fn test_fractional_integer_cell_rejected() {
        let err = Datasets::from_frames(
            geo_with(MEDIAN_INCOME, ["120000", "95000.9"]),
            concerns_text_frame(),
        )
        .unwrap_err();

        assert_eq!(err.error_code(), "MALFORMED_COLUMN");
        assert!(err.to_string().contains("median_income"));
        assert!(err.to_string().contains("95000.9"));
    }

    #[test]
    fn test_out_of_range_integer_cell_rejected() {
        for cell in ["1e30", "inf"] {
            let err = Datasets::from_frames(
                geo_with(MEDIAN_INCOME, ["120000", cell]),
                concerns_text_frame(),
            )
            .unwrap_err();
            assert_eq!(err.error_code(), "MALFORMED_COLUMN");
        }
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let err = Datasets::load_from_paths(
            Path::new("does/not/exist/geo.csv"),
            Path::new("does/not/exist/concerns.csv"),
        )
        .unwrap_err();

        assert_eq!(err.error_code(), "DATA_LOAD_FAILED");
    }
}
