//! Unsupervised anomaly detection.
//!
//! [`AnomalyDetector`] is the entry point: it selects the numeric columns of
//! a completed [`Dataset`](crate::Dataset), fits an [`IsolationForest`] and
//! appends a label column. The forest itself works on a plain
//! `ndarray::Array2<f64>` and can be used directly.

mod detector;
mod isolation_forest;

pub use detector::{
    AnomalyDetector, AnomalyReport, DetectionOutcome, LABEL_COLUMN, NO_NUMERIC_COLUMNS_NOTICE,
    PROJECTION_SKIPPED_NOTICE,
};
pub use isolation_forest::{IsolationForest, IsolationTree};
