//! Configuration for an analysis session.
//!
//! [`AnalysisConfig`] is built through a validating builder, mirroring how the
//! CLI and library callers assemble options:
//!
//! ```rust,ignore
//! use smart_analytics::config::{AnalysisConfig, AllMissingPolicy};
//!
//! let config = AnalysisConfig::builder()
//!     .contamination(0.1)
//!     .random_seed(7)
//!     .all_missing_policy(AllMissingPolicy::LeaveMissing)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

/// Default assumed share of anomalous rows.
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Largest contamination fraction accepted.
pub const MAX_CONTAMINATION: f64 = 0.2;

/// Seed used when none is configured, so repeated runs agree.
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Default number of isolation trees.
pub const DEFAULT_N_ESTIMATORS: usize = 100;

/// Default sub-sample size per isolation tree.
pub const DEFAULT_MAX_SAMPLES: usize = 256;

/// Default number of histogram bins for numeric columns.
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

/// Default number of rows shown in a dataset preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// What the imputer does with a column that has no non-missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AllMissingPolicy {
    /// Fail with a data quality error naming the column.
    #[default]
    Fail,
    /// Leave the column as-is and record a warning.
    LeaveMissing,
}

/// Returns `true` if `value` lies in the half-open range `(0, 0.2]`.
pub fn is_valid_contamination(value: f64) -> bool {
    value > 0.0 && value <= MAX_CONTAMINATION
}

/// Configuration for an analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Assumed proportion of anomalous rows, in (0, 0.2].
    /// Default: 0.05
    pub contamination: f64,

    /// Seed for the isolation forest.
    /// Default: 42
    pub random_seed: u64,

    /// Number of isolation trees.
    /// Default: 100
    pub n_estimators: usize,

    /// Maximum rows sampled per tree (clamped to the row count).
    /// Default: 256
    pub max_samples: usize,

    /// Handling of columns without any non-missing value.
    /// Default: Fail
    pub all_missing_policy: AllMissingPolicy,

    /// Equal-width bins per numeric histogram.
    /// Default: 30
    pub histogram_bins: usize,

    /// Rows shown by [`AnalysisSession::preview`](crate::AnalysisSession::preview).
    /// Default: 5
    pub preview_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            random_seed: DEFAULT_RANDOM_SEED,
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_samples: DEFAULT_MAX_SAMPLES,
            all_missing_policy: AllMissingPolicy::default(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !is_valid_contamination(self.contamination) {
            return Err(ConfigValidationError::InvalidContamination(
                self.contamination,
            ));
        }

        if self.n_estimators == 0 {
            return Err(ConfigValidationError::InvalidEstimators(self.n_estimators));
        }

        if self.max_samples == 0 {
            return Err(ConfigValidationError::InvalidMaxSamples(self.max_samples));
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidHistogramBins(
                self.histogram_bins,
            ));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid contamination: {0} (must be greater than 0.0 and at most 0.2)")]
    InvalidContamination(f64),

    #[error("Invalid number of estimators: {0} (must be at least 1)")]
    InvalidEstimators(usize),

    #[error("Invalid max samples: {0} (must be at least 1)")]
    InvalidMaxSamples(usize),

    #[error("Invalid histogram bins: {0} (must be at least 1)")]
    InvalidHistogramBins(usize),
}

/// Builder for [`AnalysisConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    contamination: Option<f64>,
    random_seed: Option<u64>,
    n_estimators: Option<usize>,
    max_samples: Option<usize>,
    all_missing_policy: Option<AllMissingPolicy>,
    histogram_bins: Option<usize>,
    preview_rows: Option<usize>,
}

impl AnalysisConfigBuilder {
    /// Set the contamination fraction.
    ///
    /// # Arguments
    /// * `fraction` - Value in (0.0, 0.2] (e.g., 0.05 = 5% of rows)
    pub fn contamination(mut self, fraction: f64) -> Self {
        self.contamination = Some(fraction);
        self
    }

    /// Set the random seed used by the isolation forest.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Set the number of isolation trees.
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = Some(n);
        self
    }

    /// Set the maximum number of rows sampled per tree.
    pub fn max_samples(mut self, n: usize) -> Self {
        self.max_samples = Some(n);
        self
    }

    /// Set the policy for columns with no observed values.
    pub fn all_missing_policy(mut self, policy: AllMissingPolicy) -> Self {
        self.all_missing_policy = Some(policy);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set the number of preview rows.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AnalysisConfig` or an error if validation fails.
    pub fn build(self) -> Result<AnalysisConfig, ConfigValidationError> {
        let config = AnalysisConfig {
            contamination: self.contamination.unwrap_or(DEFAULT_CONTAMINATION),
            random_seed: self.random_seed.unwrap_or(DEFAULT_RANDOM_SEED),
            n_estimators: self.n_estimators.unwrap_or(DEFAULT_N_ESTIMATORS),
            max_samples: self.max_samples.unwrap_or(DEFAULT_MAX_SAMPLES),
            all_missing_policy: self.all_missing_policy.unwrap_or_default(),
            histogram_bins: self.histogram_bins.unwrap_or(DEFAULT_HISTOGRAM_BINS),
            preview_rows: self.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS),
        };

        config.validate()?;
        Ok(config)
    }
}
