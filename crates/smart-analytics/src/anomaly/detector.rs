//! Row-level anomaly detection over the numeric columns of a dataset.

use super::isolation_forest::IsolationForest;
use crate::cancellation::CancellationToken;
use crate::config::{
    AnalysisConfig, DEFAULT_MAX_SAMPLES, DEFAULT_N_ESTIMATORS, DEFAULT_RANDOM_SEED,
    MAX_CONTAMINATION, is_valid_contamination,
};
use crate::dataset::Dataset;
use crate::error::{AnalyticsError, Result};
use crate::types::{AnomalyLabel, Projection, ScatterPoint};
use tracing::{debug, info, warn};

/// Name of the column holding the per-row label.
pub const LABEL_COLUMN: &str = "anomaly";

pub const NO_NUMERIC_COLUMNS_NOTICE: &str = "No numeric columns available for anomaly detection.";

pub const PROJECTION_SKIPPED_NOTICE: &str = "Not enough numeric columns for anomaly visualization.";

/// Result of one detection run.
#[derive(Debug, Clone)]
pub enum DetectionOutcome {
    /// Nothing to fit on. Not an error.
    NoNumericColumns { notice: String },
    Detected(Box<AnomalyReport>),
}

impl DetectionOutcome {
    pub fn anomaly_count(&self) -> usize {
        match self {
            Self::NoNumericColumns { .. } => 0,
            Self::Detected(report) => report.anomaly_count,
        }
    }

    pub fn report(&self) -> Option<&AnomalyReport> {
        match self {
            Self::NoNumericColumns { .. } => None,
            Self::Detected(report) => Some(report.as_ref()),
        }
    }

    /// Notice explaining a skipped step, if any.
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::NoNumericColumns { notice } => Some(notice),
            Self::Detected(report) => report.notice.as_deref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnomalyReport {
    /// Input dataset with the [`LABEL_COLUMN`] appended.
    pub labeled: Dataset,
    /// Rows of `labeled` that were flagged, in original order.
    pub anomalies: Dataset,
    pub anomaly_count: usize,
    /// Positions of flagged rows.
    pub anomalous_rows: Vec<usize>,
    pub scores: Vec<f64>,
    pub labels: Vec<AnomalyLabel>,
    pub threshold: f64,
    /// Columns the model was fitted on.
    pub numeric_columns: Vec<String>,
    /// Numeric columns left out because they hold no value at all.
    pub skipped_columns: Vec<String>,
    pub projection: Option<Projection>,
    pub notice: Option<String>,
}

/// Isolation-forest detector configured with a contamination fraction.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    contamination: f64,
    seed: u64,
    n_estimators: usize,
    max_samples: usize,
    cancellation_token: Option<CancellationToken>,
}

impl AnomalyDetector {
    /// # Errors
    ///
    /// `InvalidInput` unless `contamination` lies in `(0, 0.2]`.
    pub fn new(contamination: f64) -> Result<Self> {
        if !is_valid_contamination(contamination) {
            return Err(AnalyticsError::invalid_input(format!(
                "contamination must be in (0, {}], got {}",
                MAX_CONTAMINATION, contamination
            )));
        }
        Ok(Self {
            contamination,
            seed: DEFAULT_RANDOM_SEED,
            n_estimators: DEFAULT_N_ESTIMATORS,
            max_samples: DEFAULT_MAX_SAMPLES,
            cancellation_token: None,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self::new(config.contamination)?
            .with_seed(config.random_seed)
            .with_estimators(config.n_estimators)
            .with_max_samples(config.max_samples))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    /// Label every row of a completed dataset.
    ///
    /// # Errors
    ///
    /// Numeric columns without a single observed value are left out of the
    /// fit and listed in [`AnomalyReport::skipped_columns`].
    ///
    /// - `InvalidInput` for an empty dataset or missing cells in a partially
    ///   observed numeric column.
    /// - `Cancelled` if the cancellation token fires during the fit.
    pub fn detect(&self, dataset: &Dataset) -> Result<DetectionOutcome> {
        dataset.ensure_not_empty()?;

        let mut numeric_columns = Vec::new();
        let mut skipped_columns = Vec::new();
        for name in dataset.numeric_columns() {
            if name == LABEL_COLUMN {
                continue;
            }
            if dataset.series(&name)?.null_count() == dataset.height() {
                warn!(column = %name, "Numeric column has no values, left out of detection");
                skipped_columns.push(name);
            } else {
                numeric_columns.push(name);
            }
        }

        if numeric_columns.is_empty() {
            info!("{}", NO_NUMERIC_COLUMNS_NOTICE);
            return Ok(DetectionOutcome::NoNumericColumns {
                notice: NO_NUMERIC_COLUMNS_NOTICE.to_string(),
            });
        }

        let features = dataset.feature_matrix(&numeric_columns)?;
        let mut forest = IsolationForest::new()
            .with_n_estimators(self.n_estimators)
            .with_max_samples(self.max_samples)
            .with_contamination(self.contamination)
            .with_seed(self.seed);

        match &self.cancellation_token {
            Some(token) => forest.fit_with_cancellation(&features, token)?,
            None => forest.fit(&features)?,
        }

        let scores = forest.score_samples(&features)?;
        let threshold = forest
            .threshold()
            .ok_or_else(|| AnalyticsError::InvalidConfig("model was not fitted".to_string()))?;

        let labels: Vec<AnomalyLabel> = scores
            .iter()
            .map(|&s| {
                if s > threshold {
                    AnomalyLabel::Anomalous
                } else {
                    AnomalyLabel::Normal
                }
            })
            .collect();
        let anomalous_rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.is_anomalous())
            .map(|(row, _)| row)
            .collect();

        let labeled = dataset.with_label_column(LABEL_COLUMN, &labels)?;
        let anomalies = labeled.select_rows(&anomalous_rows)?;

        let (projection, notice) = if numeric_columns.len() >= 2 {
            let projection =
                build_projection(dataset, &numeric_columns[0], &numeric_columns[1], &labels)?;
            (Some(projection), None)
        } else {
            debug!("{}", PROJECTION_SKIPPED_NOTICE);
            (None, Some(PROJECTION_SKIPPED_NOTICE.to_string()))
        };

        info!(
            rows = dataset.height(),
            features = numeric_columns.len(),
            anomalies = anomalous_rows.len(),
            contamination = self.contamination,
            "Anomaly detection complete"
        );

        Ok(DetectionOutcome::Detected(Box::new(AnomalyReport {
            labeled,
            anomalies,
            anomaly_count: anomalous_rows.len(),
            anomalous_rows,
            scores,
            labels,
            threshold,
            numeric_columns,
            skipped_columns,
            projection,
            notice,
        })))
    }
}

fn build_projection(
    dataset: &Dataset,
    x_column: &str,
    y_column: &str,
    labels: &[AnomalyLabel],
) -> Result<Projection> {
    let xs = dataset.numeric_values(x_column)?;
    let ys = dataset.numeric_values(y_column)?;

    let points = xs
        .into_iter()
        .zip(ys)
        .zip(labels)
        .enumerate()
        .filter_map(|(row, ((x, y), label))| {
            Some(ScatterPoint {
                row,
                x: x?,
                y: y?,
                label: *label,
            })
        })
        .collect();

    Ok(Projection {
        x_column: x_column.to_string(),
        y_column: y_column.to_string(),
        points,
    })
}
