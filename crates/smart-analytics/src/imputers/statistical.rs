//! Mean/mode imputation.

use crate::config::{AllMissingPolicy, AnalysisConfig};
use crate::dataset::Dataset;
use crate::error::{AnalyticsError, Result};
use crate::types::{ColumnKind, ColumnMissing};
use crate::utils::{fill_numeric_nulls, fill_string_nulls, string_mode};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Completed dataset plus what was done to it.
#[derive(Debug, Clone)]
pub struct ImputationResult {
    /// Copy of the input with missing cells filled.
    pub dataset: Dataset,
    /// Missing counts per column before and after, in column order.
    pub missing_report: Vec<ColumnMissing>,
    /// One entry per filled column, e.g. `Filled 'age' with mean: 27.50`.
    pub steps: Vec<String>,
    /// Columns left incomplete under [`AllMissingPolicy::LeaveMissing`].
    pub warnings: Vec<String>,
}

impl ImputationResult {
    /// Missing cells remaining across all columns.
    pub fn remaining_missing(&self) -> usize {
        self.missing_report.iter().map(|c| c.missing_after).sum()
    }
}

/// Fills missing numeric cells with the column mean and missing categorical
/// cells with the column mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalImputer {
    policy: AllMissingPolicy,
}

impl StatisticalImputer {
    pub fn new(policy: AllMissingPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.all_missing_policy)
    }

    /// Produce a completed copy of `dataset`.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if the dataset has no rows or no columns.
    /// - `DataQuality` if a column has no observed value and the policy is
    ///   [`AllMissingPolicy::Fail`].
    pub fn impute(&self, dataset: &Dataset) -> Result<ImputationResult> {
        dataset.ensure_not_empty()?;

        let mut columns: Vec<Column> = Vec::with_capacity(dataset.width());
        let mut missing_report = Vec::with_capacity(dataset.width());
        let mut steps = Vec::new();
        let mut warnings = Vec::new();

        for column_schema in dataset.schema() {
            let name = &column_schema.name;
            let series = dataset.series(name)?;
            let missing_before = series.null_count();

            let filled = if missing_before == 0 {
                series.clone()
            } else if missing_before == series.len() {
                self.handle_all_missing(name, &mut warnings)?;
                series.clone()
            } else {
                match column_schema.kind {
                    ColumnKind::Numeric => Self::fill_mean(series, &mut steps)?,
                    ColumnKind::Categorical => Self::fill_mode(series, &mut steps)?,
                }
            };

            missing_report.push(ColumnMissing {
                column: name.clone(),
                kind: column_schema.kind,
                missing_before,
                missing_after: filled.null_count(),
            });
            columns.push(filled.into());
        }

        let frame = DataFrame::new(columns)?;
        let result = ImputationResult {
            dataset: Dataset::from_parts(frame, dataset.schema().to_vec()),
            missing_report,
            steps,
            warnings,
        };

        info!(
            filled_columns = result.steps.len(),
            remaining_missing = result.remaining_missing(),
            "Imputation complete"
        );
        Ok(result)
    }

    fn handle_all_missing(&self, column: &str, warnings: &mut Vec<String>) -> Result<()> {
        match self.policy {
            AllMissingPolicy::Fail => Err(AnalyticsError::data_quality(
                column,
                "no non-missing values to compute a fill value from",
            )),
            AllMissingPolicy::LeaveMissing => {
                let message = format!("Column '{}' has no values and was left missing", column);
                warn!("{}", message);
                warnings.push(message);
                Ok(())
            }
        }
    }

    fn fill_mean(series: &Series, steps: &mut Vec<String>) -> Result<Series> {
        let mean = series.mean().ok_or_else(|| {
            AnalyticsError::data_quality(series.name().as_str(), "mean is undefined")
        })?;
        let filled = fill_numeric_nulls(series, mean)?;

        debug!(column = %series.name(), mean, "Filled numeric column");
        steps.push(format!("Filled '{}' with mean: {:.2}", series.name(), mean));
        Ok(filled)
    }

    fn fill_mode(series: &Series, steps: &mut Vec<String>) -> Result<Series> {
        let mode = string_mode(series).ok_or_else(|| {
            AnalyticsError::data_quality(series.name().as_str(), "mode is undefined")
        })?;
        let filled = fill_string_nulls(series, &mode)?;

        debug!(column = %series.name(), mode = %mode, "Filled categorical column");
        steps.push(format!("Filled '{}' with mode: '{}'", series.name(), mode));
        Ok(filled)
    }
}
