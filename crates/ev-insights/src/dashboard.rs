//! One recomputation pass per interaction.
//!
//! [`Dashboard`] owns a shared handle to the loaded datasets and turns a
//! [`Selection`] into a [`DashboardSnapshot`] holding every value the
//! presentation layer renders:
//!
//! ```text
//! Datasets (Arc, read-only)
//!    │
//!    ├─ filter ──► geo rows ──► summary metrics ─┐
//!    │                 ├──────► map layer        │
//!    │                 └──────► Top-K ───────────┼──► recommendations
//!    └─ filter ──► concern rows ─► aggregate ────┘
//! ```

use crate::aggregate::{concern_aggregate, summary_metrics, top_k, top_zips};
use crate::config::{ConfigValidationError, DashboardConfig, TOP_K_MAX, TOP_K_MIN};
use crate::error::Result;
use crate::export::top_zips_csv;
use crate::filter::{
    available_cities, available_states, default_city, default_state, filter_selection,
    region_options,
};
use crate::loader::Datasets;
use crate::map::{MapLayer, map_layer};
use crate::recommend::{Recommendation, RecommendationContext, RecommendationEngine};
use crate::types::{ConcernSummary, RegionFilter, RegionOptions, Selection, SummaryMetrics, TopZip};
use chrono::Utc;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Every computed output for one selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// RFC 3339 timestamp of the computation.
    pub generated_at: String,
    pub selection: Selection,
    pub options: RegionOptions,
    pub top_k: usize,
    pub metrics: SummaryMetrics,
    pub map: MapLayer,
    pub top_zips: Vec<TopZip>,
    pub concerns: Vec<ConcernSummary>,
    pub recommendations: Vec<Recommendation>,
}

/// Read-only view over the loaded datasets. Cheap to clone per session.
#[derive(Debug, Clone)]
pub struct Dashboard {
    data: Arc<Datasets>,
    engine: RecommendationEngine,
}

impl Dashboard {
    pub fn new(data: Arc<Datasets>) -> Self {
        Self {
            data,
            engine: RecommendationEngine::default(),
        }
    }

    /// Replace the recommendation rule table.
    pub fn with_engine(mut self, engine: RecommendationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn datasets(&self) -> &Datasets {
        &self.data
    }

    /// Selector choices for the given state.
    pub fn options(&self, state: &RegionFilter) -> Result<RegionOptions> {
        region_options(self.data.geo(), state)
    }

    /// Initial selection for a new session.
    pub fn default_selection(&self, config: &DashboardConfig) -> Result<Selection> {
        self.resolve_selection(config, None, None)
    }

    /// Combine explicitly requested values with the default policy.
    ///
    /// A missing state falls back to the default state; a missing city falls
    /// back to the default city for the resolved state. Requested values
    /// that the data does not contain are kept (they filter to nothing) and
    /// logged.
    pub fn resolve_selection(
        &self,
        config: &DashboardConfig,
        state: Option<&str>,
        city: Option<&str>,
    ) -> Result<Selection> {
        let geo = self.data.geo();
        let states = available_states(geo)?;

        let state = match state {
            Some(requested) => {
                let requested = RegionFilter::parse(requested);
                if let Some(value) = requested.value()
                    && !states.iter().any(|s| s == value)
                {
                    warn!("State '{}' not found in the geo dataset", value);
                }
                requested
            }
            None => default_state(&states, config),
        };

        let cities = available_cities(geo, &state)?;
        let city = match city {
            Some(requested) => {
                let requested = RegionFilter::parse(requested);
                if let Some(value) = requested.value()
                    && !cities.iter().any(|c| c == value)
                {
                    warn!("City '{}' not found for state {}", value, state);
                }
                requested
            }
            None => default_city(&cities, &state, config),
        };

        Ok(Selection { state, city })
    }

    /// The ranked Top-K frame for a selection.
    pub fn top_k_frame(&self, selection: &Selection, k: usize) -> Result<DataFrame> {
        check_top_k(k)?;
        let geo = filter_selection(self.data.geo(), selection)?;
        top_k(&geo, k)
    }

    /// CSV export bytes of the Top-K table for a selection.
    pub fn top_zips_csv(&self, selection: &Selection, k: usize) -> Result<Vec<u8>> {
        top_zips_csv(&self.top_k_frame(selection, k)?)
    }

    /// Run filter, aggregation, map and recommendations for a selection.
    pub fn snapshot(&self, selection: &Selection, k: usize) -> Result<DashboardSnapshot> {
        check_top_k(k)?;

        let geo = filter_selection(self.data.geo(), selection)?;
        let concerns_rows = filter_selection(self.data.concerns(), selection)?;
        debug!(
            "Selection {}: {} geo rows, {} concern rows",
            selection,
            geo.height(),
            concerns_rows.height()
        );

        let metrics = summary_metrics(&geo)?;
        let map = map_layer(&geo, selection)?;
        let top_zips = top_zips(&top_k(&geo, k)?)?;
        let concerns = concern_aggregate(&concerns_rows)?;

        let recommendations = self.engine.recommend(&RecommendationContext {
            metrics: &metrics,
            top_zips: &top_zips,
            concerns: &concerns,
        });

        Ok(DashboardSnapshot {
            generated_at: Utc::now().to_rfc3339(),
            selection: selection.clone(),
            options: self.options(&selection.state)?,
            top_k: k,
            metrics,
            map,
            top_zips,
            concerns,
            recommendations,
        })
    }
}

fn check_top_k(k: usize) -> Result<()> {
    if (TOP_K_MIN..=TOP_K_MAX).contains(&k) {
        Ok(())
    } else {
        Err(ConfigValidationError::TopKOutOfRange(k).into())
    }
}
