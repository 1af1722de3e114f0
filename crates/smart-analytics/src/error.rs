//! Error types for dataset analysis.
//!
//! All library operations return [`AnalyticsError`]. The CLI wraps them in
//! `anyhow` at the top level; library callers can match on the variants or
//! use [`AnalyticsError::error_code`] for stable machine-readable codes.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for analysis operations.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Malformed or empty dataset, or an out-of-range parameter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A column cannot be processed because of its contents.
    #[error("Data quality problem in column '{column}': {reason}")]
    DataQuality { column: String, reason: String },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A long-running fit was cancelled by the caller.
    #[error("Analysis cancelled")]
    Cancelled,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalyticsError>,
    },
}

impl AnalyticsError {
    /// Shorthand for [`AnalyticsError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Shorthand for [`AnalyticsError::DataQuality`].
    pub fn data_quality(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataQuality {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalyticsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, preserved through [`with_context`](Self::with_context).
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::DataQuality { .. } => "DATA_QUALITY",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Cancelled => "CANCELLED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Errors caused by what the user supplied rather than by a fault.
    ///
    /// The CLI reports these without a backtrace-style dump.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::InvalidInput(_)
            | Self::DataQuality { .. }
            | Self::ColumnNotFound(_)
            | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_user_error(),
            _ => false,
        }
    }
}

impl From<ConfigValidationError> for AnalyticsError {
    fn from(err: ConfigValidationError) -> Self {
        match err {
            ConfigValidationError::InvalidContamination(_) => Self::InvalidInput(err.to_string()),
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}

/// Errors serialize as `{ "code": ..., "message": ... }`.
impl Serialize for AnalyticsError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalyticsError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

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
        self.map_err(|e| AnalyticsError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(AnalyticsError::Cancelled.error_code(), "CANCELLED");
        assert_eq!(
            AnalyticsError::invalid_input("empty").error_code(),
            "INVALID_INPUT"
        );
        assert_eq!(
            AnalyticsError::data_quality("age", "all values missing").error_code(),
            "DATA_QUALITY"
        );
    }

    #[test]
    fn test_is_cancelled_through_context() {
        let error = AnalyticsError::Cancelled.with_context("While fitting");
        assert!(error.is_cancelled());
        assert!(!AnalyticsError::invalid_input("x").is_cancelled());
    }

    #[test]
    fn test_is_user_error() {
        assert!(AnalyticsError::invalid_input("bad").is_user_error());
        assert!(AnalyticsError::data_quality("c", "r").is_user_error());
        assert!(!AnalyticsError::Cancelled.is_user_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = AnalyticsError::ColumnNotFound("Age".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("Age"));
    }

    #[test]
    fn test_with_context_preserves_code() {
        let error = AnalyticsError::data_quality("city", "no values").with_context("Imputing");
        assert!(error.to_string().contains("Imputing"));
        assert_eq!(error.error_code(), "DATA_QUALITY");
    }

    #[test]
    fn test_contamination_validation_maps_to_invalid_input() {
        let error: AnalyticsError = ConfigValidationError::InvalidContamination(0.5).into();
        assert_eq!(error.error_code(), "INVALID_INPUT");

        let error: AnalyticsError = ConfigValidationError::InvalidEstimators(0).into();
        assert_eq!(error.error_code(), "INVALID_CONFIG");
    }
}
