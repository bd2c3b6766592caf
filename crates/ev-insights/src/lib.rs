//! EV Market Insights
//!
//! A small analytics engine built on Polars that answers two questions for a
//! region: *where* to focus EV campaigns and *which* buyer barriers to address.
//!
//! # Overview
//!
//! - **Loading**: two CSV datasets (ZIP-level sales predictions and buyer
//!   concern samples) are read once into an immutable [`Datasets`] handle
//! - **Filtering**: cascading state → city selection with an `ALL` wildcard
//! - **Aggregation**: headline metrics, a stable Top-K ranking by predicted
//!   sales and a grouped concern/sentiment table
//! - **Recommendations**: an ordered table of business rules with a fallback
//! - **Outputs**: a map layer, a serializable [`DashboardSnapshot`] and a
//!   CSV export of the Top-K table
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ev_insights::{Dashboard, DashboardConfig, Datasets};
//! use std::sync::Arc;
//!
//! let config = DashboardConfig::builder()
//!     .geo_path("ev_geo_data.csv")
//!     .concerns_path("ev_concerns_sample.csv")
//!     .build()?;
//!
//! let dashboard = Dashboard::new(Arc::new(Datasets::load(&config)?));
//! let selection = dashboard.default_selection(&config)?;
//! let snapshot = dashboard.snapshot(&selection, config.top_k)?;
//!
//! for rec in &snapshot.recommendations {
//!     println!("- {}", rec.message);
//! }
//! ```
//!
//! # Empty selections
//!
//! A selection that matches no rows is valid. Totals are 0, means are
//! `None`, the Top-K and concern tables are empty, and the recommendation
//! engine emits its fallback message.

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod map;
pub mod recommend;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use aggregate::{concern_aggregate, summary_metrics, top_k, top_zips};
pub use config::{
    ConfigValidationError, DashboardConfig, DashboardConfigBuilder, TOP_K_MAX, TOP_K_MIN,
};
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use error::{InsightsError, Result as InsightsResult, ResultExt};
pub use export::{top_zips_csv, write_top_zips};
pub use filter::{available_cities, available_states, default_selection, filter_records};
pub use loader::{DatasetKind, Datasets};
pub use map::{MapLayer, MapPoint, MapStyle, MapView, map_layer};
pub use recommend::{
    Recommendation, RecommendationContext, RecommendationEngine, RecommendationRule,
};
pub use types::{
    ConcernSummary, RegionFilter, RegionOptions, Selection, SummaryMetrics, TopZip, WILDCARD,
};
pub use utils::{format_sales, format_thousands};
