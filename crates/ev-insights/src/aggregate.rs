//! Aggregations over a filtered selection: headline metrics, the Top-K
//! ranking and the grouped concern table.

use crate::error::{Result, ResultExt};
use crate::types::{
    AVG_SENTIMENT, CHARGING_STATIONS, CITY, CONCERN, ConcernSummary, EV_SHARE, MEDIAN_INCOME,
    MENTION_COUNT, POPULATION, PREDICTED_SALES, STATE, SummaryMetrics, TopZip, ZIP,
};
use crate::utils::{column_mean, column_sum, f64_values, i64_values, str_values};
use polars::prelude::*;
use tracing::debug;

/// Compute the headline metrics over the filtered geo rows.
///
/// An empty selection yields a total of 0 and `None` for every mean.
pub fn summary_metrics(geo: &DataFrame) -> Result<SummaryMetrics> {
    Ok(SummaryMetrics {
        zip_count: geo.height(),
        total_predicted_sales: column_sum(geo, PREDICTED_SALES)?,
        avg_median_income: column_mean(geo, MEDIAN_INCOME)?,
        avg_charging_stations: column_mean(geo, CHARGING_STATIONS)?,
        avg_ev_share: column_mean(geo, EV_SHARE)?,
    })
}

/// The `k` rows with the highest predicted sales, highest first.
///
/// The sort is stable: rows with equal predictions keep their relative
/// order from the input. Missing predictions rank last.
pub fn top_k(geo: &DataFrame, k: usize) -> Result<DataFrame> {
    let sorted = geo.sort(
        [PREDICTED_SALES],
        SortMultipleOptions::default()
            .with_order_descending(true)
            .with_nulls_last(true)
            .with_maintain_order(true),
    )?;
    Ok(sorted.head(Some(k)))
}

/// Read the rows of a (Top-K) geo frame into table records.
pub fn top_zips(frame: &DataFrame) -> Result<Vec<TopZip>> {
    let zips = str_values(frame, ZIP)?;
    let cities = str_values(frame, CITY)?;
    let states = str_values(frame, STATE)?;
    let populations = i64_values(frame, POPULATION)?;
    let incomes = i64_values(frame, MEDIAN_INCOME)?;
    let stations = i64_values(frame, CHARGING_STATIONS)?;
    let sales = f64_values(frame, PREDICTED_SALES)?;

    let rows = (0..frame.height())
        .map(|i| TopZip {
            zip: zips[i].clone().unwrap_or_default(),
            city: cities[i].clone().unwrap_or_default(),
            state: states[i].clone().unwrap_or_default(),
            population: populations[i],
            median_income: incomes[i],
            charging_stations: stations[i],
            predicted_sales: sales[i],
        })
        .collect();

    Ok(rows)
}

/// Group the filtered concern rows by label.
///
/// Mention counts are summed; sentiment is the plain mean of the row
/// values, not weighted by mentions. Rows come back by mention count
/// descending, ties by label ascending. Rows without a label are ignored.
pub fn concern_aggregate(concerns: &DataFrame) -> Result<Vec<ConcernSummary>> {
    let grouped = concerns
        .clone()
        .lazy()
        .filter(col(CONCERN).is_not_null())
        .group_by_stable([col(CONCERN)])
        .agg([
            col(MENTION_COUNT).sum().alias(MENTION_COUNT),
            col(AVG_SENTIMENT).mean().alias(AVG_SENTIMENT),
        ])
        .sort(
            [MENTION_COUNT, CONCERN],
            SortMultipleOptions::default()
                .with_order_descending_multi([true, false])
                .with_maintain_order(true),
        )
        .collect()
        .context("Aggregating concerns")?;

    debug!(
        "Aggregated {} concern rows into {} groups",
        concerns.height(),
        grouped.height()
    );

    let labels = str_values(&grouped, CONCERN)?;
    let mentions = i64_values(&grouped, MENTION_COUNT)?;
    let sentiments = f64_values(&grouped, AVG_SENTIMENT)?;

    let rows = labels
        .into_iter()
        .zip(mentions)
        .zip(sentiments)
        .map(|((concern, mention_count), avg_sentiment)| ConcernSummary {
            concern: concern.unwrap_or_default(),
            mention_count: mention_count.unwrap_or(0),
            avg_sentiment: avg_sentiment.filter(|v| v.is_finite()),
        })
        .collect();

    Ok(rows)
}
