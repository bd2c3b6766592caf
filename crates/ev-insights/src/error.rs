//! Error types for the EV insights engine.
//!
//! Every fallible operation in the library returns [`InsightsError`].
//! Load failures are fatal for a session; an empty filter result is never
//! an error and is handled by the aggregation and recommendation layers.
//!
//! Errors are serializable so a frontend can show a stable `code` next to
//! the human-readable message.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for loading and analysing the EV datasets.
#[derive(Error, Debug)]
pub enum InsightsError {
    /// A dataset file could not be opened or parsed as CSV.
    #[error("Failed to load dataset {path:?}: {reason}")]
    DataLoad { path: PathBuf, reason: String },

    /// A required column is absent from a dataset.
    #[error("Column '{column}' not found in {dataset} dataset")]
    MissingColumn { dataset: String, column: String },

    /// A column holds values that cannot be read as the expected type.
    #[error("Column '{column}' in {dataset} dataset is malformed: {reason}")]
    MalformedColumn {
        dataset: String,
        column: String,
        reason: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The Top-K table could not be exported.
    #[error("Failed to export Top-K table: {0}")]
    Export(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightsError>,
    },
}

impl InsightsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DataLoad { .. } => "DATA_LOAD_FAILED",
            Self::MissingColumn { .. } => "MISSING_COLUMN",
            Self::MalformedColumn { .. } => "MALFORMED_COLUMN",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Export(_) => "EXPORT_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error belongs to the dataset loading family.
    ///
    /// These abort session start: there is nothing to filter without data.
    pub fn is_data_load_error(&self) -> bool {
        match self {
            Self::DataLoad { .. } | Self::MissingColumn { .. } | Self::MalformedColumn { .. } => {
                true
            }
            Self::WithContext { source, .. } => source.is_data_load_error(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for InsightsError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        InsightsError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for InsightsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for insights operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightsError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::io::Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightsError::Io(e).with_context(context))
    }
}
