use crate::utils::{format_sales, format_thousands};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Dataset Columns
// ============================================================================

pub const ZIP: &str = "zip";
pub const CITY: &str = "city";
pub const STATE: &str = "state";
pub const LAT: &str = "lat";
pub const LON: &str = "lon";
pub const POPULATION: &str = "population";
pub const MEDIAN_INCOME: &str = "median_income";
pub const CHARGING_STATIONS: &str = "charging_stations";
pub const EV_SHARE: &str = "ev_share";
pub const PREDICTED_SALES: &str = "predicted_ev_sales_next_12m";

pub const CONCERN: &str = "concern";
pub const MENTION_COUNT: &str = "mention_count";
pub const AVG_SENTIMENT: &str = "avg_sentiment";

/// Selector value meaning "no restriction on this dimension".
pub const WILDCARD: &str = "ALL";

// ============================================================================
// Region Selection
// ============================================================================

/// One dimension of the region filter: either the wildcard or a concrete value.
///
/// Serialized as a plain string so `"ALL"` round-trips to [`RegionFilter::All`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegionFilter {
    #[default]
    All,
    Only(String),
}

impl RegionFilter {
    /// Parse a selector value. `ALL` (surrounding whitespace ignored) is the wildcard.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value == WILDCARD {
            RegionFilter::All
        } else {
            RegionFilter::Only(value.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, RegionFilter::All)
    }

    /// The concrete value, or `None` for the wildcard.
    pub fn value(&self) -> Option<&str> {
        match self {
            RegionFilter::All => None,
            RegionFilter::Only(value) => Some(value),
        }
    }
}

impl From<&str> for RegionFilter {
    fn from(value: &str) -> Self {
        RegionFilter::parse(value)
    }
}

impl From<String> for RegionFilter {
    fn from(value: String) -> Self {
        RegionFilter::parse(&value)
    }
}

impl From<RegionFilter> for String {
    fn from(filter: RegionFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionFilter::All => write!(f, "{}", WILDCARD),
            RegionFilter::Only(value) => write!(f, "{}", value),
        }
    }
}

/// The state and city a dashboard view is filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub state: RegionFilter,
    pub city: RegionFilter,
}

impl Selection {
    pub fn new(state: impl Into<RegionFilter>, city: impl Into<RegionFilter>) -> Self {
        Self {
            state: state.into(),
            city: city.into(),
        }
    }

    /// Wildcard on both dimensions.
    pub fn all() -> Self {
        Self::default()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state={}, city={}", self.state, self.city)
    }
}

/// Choices offered by the state and city selectors, wildcard excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOptions {
    /// Distinct states, ascending.
    pub states: Vec<String>,
    /// Distinct cities of the selected state (all cities for the wildcard), ascending.
    pub cities: Vec<String>,
}

// ============================================================================
// Aggregates
// ============================================================================

/// Headline metrics over the filtered geo rows.
///
/// Means are `None` when there is no data to average (empty selection or
/// all values missing); they are never NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// Number of ZIP rows in the selection.
    pub zip_count: usize,
    /// Sum of predicted sales; 0 for an empty selection.
    pub total_predicted_sales: f64,
    pub avg_median_income: Option<f64>,
    pub avg_charging_stations: Option<f64>,
    pub avg_ev_share: Option<f64>,
}

impl SummaryMetrics {
    /// Total predicted sales truncated to a whole number for display.
    pub fn total_predicted_sales_whole(&self) -> i64 {
        self.total_predicted_sales.trunc() as i64
    }

    /// Average median income truncated to a whole number for display.
    pub fn avg_median_income_whole(&self) -> Option<i64> {
        self.avg_median_income.map(|v| v.trunc() as i64)
    }

    /// Average charging-station count truncated to a whole number for display.
    pub fn avg_charging_stations_whole(&self) -> Option<i64> {
        self.avg_charging_stations.map(|v| v.trunc() as i64)
    }

    /// The three headline metrics as (label, formatted value) pairs.
    pub fn display_rows(&self) -> [(&'static str, String); 3] {
        [
            (
                "Predicted EV sales (next 12m)",
                format_thousands(self.total_predicted_sales_whole()),
            ),
            (
                "Median income (avg)",
                self.avg_median_income_whole()
                    .map_or_else(|| "n/a".to_string(), |v| format!("${}", format_thousands(v))),
            ),
            (
                "Charging stations (avg)",
                self.avg_charging_stations_whole()
                    .map_or_else(|| "n/a".to_string(), format_thousands),
            ),
        ]
    }
}

/// One row of the ranked Top-K table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopZip {
    pub zip: String,
    pub city: String,
    pub state: String,
    pub population: Option<i64>,
    pub median_income: Option<i64>,
    pub charging_stations: Option<i64>,
    pub predicted_sales: Option<f64>,
}

impl TopZip {
    pub fn predicted_sales_display(&self) -> String {
        format_sales(self.predicted_sales)
    }
}

/// Mentions and sentiment for one concern label within the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcernSummary {
    pub concern: String,
    /// Sum of mention counts across the group.
    pub mention_count: i64,
    /// Unweighted mean of the per-row sentiment scores.
    pub avg_sentiment: Option<f64>,
}
