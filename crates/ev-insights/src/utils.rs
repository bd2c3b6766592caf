//! Shared helpers for reading typed values out of data frames and for
//! formatting numbers the way the dashboard displays them.

use crate::error::Result;
use polars::prelude::*;
use std::collections::BTreeSet;

// =============================================================================
// Column Extraction
// =============================================================================

/// Read a column as optional strings, casting if needed.
pub fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Read a column as optional `f64` values, casting if needed.
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Read a column as optional `i64` values, casting if needed.
pub fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    Ok(series.i64()?.into_iter().collect())
}

/// Distinct non-null values of a text column, ascending.
pub fn distinct_sorted(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let distinct: BTreeSet<String> = str_values(df, name)?.into_iter().flatten().collect();
    Ok(distinct.into_iter().collect())
}

// =============================================================================
// Numeric Reductions
// =============================================================================

/// Arithmetic mean of the non-null values of a numeric column.
///
/// Returns `None` when there is nothing to average.
pub fn column_mean(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.mean().filter(|v| v.is_finite()))
}

/// Sum of the non-null values of a numeric column (0 when empty).
pub fn column_sum(df: &DataFrame, name: &str) -> Result<f64> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.sum().unwrap_or(0.0))
}

// =============================================================================
// Formatting
// =============================================================================

/// Format an integer with `,` thousands separators.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(format_thousands(1234567), "1,234,567");
/// assert_eq!(format_thousands(-950), "-950");
/// ```
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Format a predicted-sales value: whole numbers without a fraction,
/// anything else as-is, missing values as `n/a`.
pub fn format_sales(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => format!("{}", v),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "city" => ["Austin", "Houston", "Austin", "Dallas"],
            "value" => [Some(10i64), None, Some(20), Some(30)],
        )
        .unwrap()
    }

    #[test]
    fn test_distinct_sorted() {
        let cities = distinct_sorted(&sample_df(), "city").unwrap();
        assert_eq!(cities, vec!["Austin", "Dallas", "Houston"]);
    }

    #[test]
    fn test_mean_and_sum_skip_nulls() {
        let df = sample_df();
        assert_eq!(column_mean(&df, "value").unwrap(), Some(20.0));
        assert_eq!(column_sum(&df, "value").unwrap(), 60.0);
    }

    #[test]
    fn test_mean_of_empty_frame_is_none() {
        let df = sample_df().head(Some(0));
        assert_eq!(column_mean(&df, "value").unwrap(), None);
        assert_eq!(column_sum(&df, "value").unwrap(), 0.0);
    }

    #[test]
    fn test_typed_values() {
        let df = sample_df();
        assert_eq!(
            i64_values(&df, "value").unwrap(),
            vec![Some(10), None, Some(20), Some(30)]
        );
        assert_eq!(f64_values(&df, "value").unwrap()[2], Some(20.0));
        assert_eq!(
            str_values(&df, "city").unwrap()[1].as_deref(),
            Some("Houston")
        );
    }

    #[test]
    fn test_missing_column_is_error() {
        assert!(column_mean(&sample_df(), "nope").is_err());
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
        assert_eq!(format_thousands(-77500), "-77,500");
    }

    #[test]
    fn test_format_sales() {
        assert_eq!(format_sales(Some(120.0)), "120");
        assert_eq!(format_sales(Some(80.5)), "80.5");
        assert_eq!(format_sales(None), "n/a");
    }
}
