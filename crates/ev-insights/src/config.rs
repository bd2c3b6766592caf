//! Configuration types for the EV insights dashboard.
//!
//! This module provides configuration options using the builder pattern.
//! The same struct can be deserialized from JSON so a frontend (or the
//! `--config` CLI flag) can supply it wholesale.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest Top-K size a caller may request.
pub const TOP_K_MIN: usize = 3;

/// Largest Top-K size a caller may request.
pub const TOP_K_MAX: usize = 10;

/// Configuration for a dashboard session.
///
/// Use [`DashboardConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use ev_insights::config::DashboardConfig;
///
/// let config = DashboardConfig::builder()
///     .geo_path("data/ev_geo_data.csv")
///     .top_k(8)
///     .preferred_state("CA")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Path to the geographic predictions CSV.
    /// Default: "ev_geo_data.csv"
    pub geo_path: PathBuf,

    /// Path to the buyer concerns CSV.
    /// Default: "ev_concerns_sample.csv"
    pub concerns_path: PathBuf,

    /// State selected on first load when it is present in the data.
    /// Default: Some("TX")
    pub preferred_state: Option<String>,

    /// City selected on first load when the preferred state is selected
    /// and this city belongs to it.
    /// Default: Some("Austin")
    pub preferred_city: Option<String>,

    /// Number of ZIP codes in the ranked table ([`TOP_K_MIN`]..=[`TOP_K_MAX`]).
    /// Default: 5
    pub top_k: usize,

    /// Directory the Top-K CSV export is written to.
    /// Default: "outputs"
    pub output_dir: PathBuf,

    /// File name of the Top-K CSV export.
    /// Default: "top_zips.csv"
    pub export_file_name: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            geo_path: PathBuf::from("ev_geo_data.csv"),
            concerns_path: PathBuf::from("ev_concerns_sample.csv"),
            preferred_state: Some("TX".to_string()),
            preferred_city: Some("Austin".to_string()),
            top_k: 5,
            output_dir: PathBuf::from("outputs"),
            export_file_name: "top_zips.csv".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Start a builder pre-filled with this configuration's values.
    ///
    /// Used by the CLI to layer flags over a JSON config file.
    pub fn to_builder(&self) -> DashboardConfigBuilder {
        DashboardConfigBuilder {
            geo_path: Some(self.geo_path.clone()),
            concerns_path: Some(self.concerns_path.clone()),
            preferred_state: Some(self.preferred_state.clone()),
            preferred_city: Some(self.preferred_city.clone()),
            top_k: Some(self.top_k),
            output_dir: Some(self.output_dir.clone()),
            export_file_name: Some(self.export_file_name.clone()),
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(TOP_K_MIN..=TOP_K_MAX).contains(&self.top_k) {
            return Err(ConfigValidationError::TopKOutOfRange(self.top_k));
        }

        if self.export_file_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyFileName);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid top_k: {0} (must be between {min} and {max})", min = TOP_K_MIN, max = TOP_K_MAX)]
    TopKOutOfRange(usize),

    #[error("Export file name must not be empty")]
    EmptyFileName,
}

/// Builder for [`DashboardConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    geo_path: Option<PathBuf>,
    concerns_path: Option<PathBuf>,
    preferred_state: Option<Option<String>>,
    preferred_city: Option<Option<String>>,
    top_k: Option<usize>,
    output_dir: Option<PathBuf>,
    export_file_name: Option<String>,
}

impl DashboardConfigBuilder {
    /// Set the path of the geographic predictions CSV.
    pub fn geo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.geo_path = Some(path.into());
        self
    }

    /// Set the path of the buyer concerns CSV.
    pub fn concerns_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.concerns_path = Some(path.into());
        self
    }

    /// Set the state selected on first load.
    pub fn preferred_state(mut self, state: impl Into<String>) -> Self {
        self.preferred_state = Some(Some(state.into()));
        self
    }

    /// Start on the wildcard state instead of a preferred one.
    pub fn no_preferred_state(mut self) -> Self {
        self.preferred_state = Some(None);
        self
    }

    /// Set the city selected on first load.
    pub fn preferred_city(mut self, city: impl Into<String>) -> Self {
        self.preferred_city = Some(Some(city.into()));
        self
    }

    /// Start on the wildcard city instead of a preferred one.
    pub fn no_preferred_city(mut self) -> Self {
        self.preferred_city = Some(None);
        self
    }

    /// Set the Top-K table size.
    ///
    /// # Arguments
    /// * `k` - Value between [`TOP_K_MIN`] and [`TOP_K_MAX`]
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Set the output directory for the CSV export.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the CSV export file name.
    pub fn export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = Some(name.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DashboardConfig` or an error if validation fails.
    pub fn build(self) -> Result<DashboardConfig, ConfigValidationError> {
        let defaults = DashboardConfig::default();
        let config = DashboardConfig {
            geo_path: self.geo_path.unwrap_or(defaults.geo_path),
            concerns_path: self.concerns_path.unwrap_or(defaults.concerns_path),
            preferred_state: self.preferred_state.unwrap_or(defaults.preferred_state),
            preferred_city: self.preferred_city.unwrap_or(defaults.preferred_city),
            top_k: self.top_k.unwrap_or(defaults.top_k),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            export_file_name: self.export_file_name.unwrap_or(defaults.export_file_name),
        };

        config.validate()?;
        Ok(config)
    }
}
