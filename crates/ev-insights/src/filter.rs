//! Region filtering and selector choices.
//!
//! Filters are plain equality masks on the `state` and `city` columns, so
//! they apply to both datasets and the order they are applied in does not
//! matter. An empty result is a normal outcome, never an error.

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::types::{CITY, RegionFilter, RegionOptions, STATE, Selection};
use crate::utils::distinct_sorted;
use polars::prelude::*;
use tracing::debug;

/// Distinct states present in the geo dataset, ascending.
pub fn available_states(geo: &DataFrame) -> Result<Vec<String>> {
    distinct_sorted(geo, STATE)
}

/// Distinct cities for the selected state, ascending.
///
/// The wildcard returns every city in the dataset; a state with no rows
/// returns an empty list.
pub fn available_cities(geo: &DataFrame, state: &RegionFilter) -> Result<Vec<String>> {
    let scoped = filter_records(geo, state, &RegionFilter::All)?;
    distinct_sorted(&scoped, CITY)
}

/// Both selector choice lists for a given state.
pub fn region_options(geo: &DataFrame, state: &RegionFilter) -> Result<RegionOptions> {
    Ok(RegionOptions {
        states: available_states(geo)?,
        cities: available_cities(geo, state)?,
    })
}

/// Keep the rows matching `state` and `city`, preserving row order.
pub fn filter_records(
    records: &DataFrame,
    state: &RegionFilter,
    city: &RegionFilter,
) -> Result<DataFrame> {
    let mut filtered = records.clone();

    if let Some(state) = state.value() {
        filtered = filter_equal(&filtered, STATE, state)?;
    }

    if let Some(city) = city.value() {
        filtered = filter_equal(&filtered, CITY, city)?;
    }

    debug!(
        "Filtered {} -> {} rows (state={}, city={})",
        records.height(),
        filtered.height(),
        state,
        city
    );

    Ok(filtered)
}

/// [`filter_records`] for a whole [`Selection`].
pub fn filter_selection(records: &DataFrame, selection: &Selection) -> Result<DataFrame> {
    filter_records(records, &selection.state, &selection.city)
}

fn filter_equal(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame> {
    let mask = df
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::String)?
        .str()?
        .equal(value);
    Ok(df.filter(&mask)?)
}

/// State selected on first load: the preferred state if the data has it.
pub fn default_state(states: &[String], config: &DashboardConfig) -> RegionFilter {
    match &config.preferred_state {
        Some(preferred) if states.contains(preferred) => RegionFilter::Only(preferred.clone()),
        _ => RegionFilter::All,
    }
}

/// City selected on first load for `state`.
///
/// The preferred city is only used while the preferred state is selected
/// and the city belongs to it.
pub fn default_city(
    cities: &[String],
    state: &RegionFilter,
    config: &DashboardConfig,
) -> RegionFilter {
    let state_is_preferred = match (state.value(), config.preferred_state.as_deref()) {
        (Some(selected), Some(preferred)) => selected == preferred,
        _ => false,
    };

    match &config.preferred_city {
        Some(city) if state_is_preferred && cities.contains(city) => {
            RegionFilter::Only(city.clone())
        }
        _ => RegionFilter::All,
    }
}

/// Initial state and city for a new session.
pub fn default_selection(geo: &DataFrame, config: &DashboardConfig) -> Result<Selection> {
    let state = default_state(&available_states(geo)?, config);
    let city = default_city(&available_cities(geo, &state)?, &state, config);
    Ok(Selection { state, city })
}
