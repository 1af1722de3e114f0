//! Smart Data Analytics Library
//!
//! Load a CSV dataset, complete its missing values and run one of three
//! analyses over it, built on Polars.
//!
//! # Overview
//!
//! - **Loading**: CSV with a header row, each column declared numeric or
//!   categorical once at load time
//! - **Imputation**: column mean for numeric cells, column mode for
//!   categorical cells
//! - **EDA**: descriptive statistics, categorical summaries, correlation
//!   matrix, histograms
//! - **Visualization data**: correlation and pairwise scatter column pairs
//! - **Anomaly detection**: seeded isolation forest over the numeric columns,
//!   with a labeled dataset and a 2-D projection for plotting
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use smart_analytics::{AnalysisAction, AnalysisConfig, AnalysisSession, ActionOutcome};
//!
//! let config = AnalysisConfig::builder()
//!     .contamination(0.05)
//!     .random_seed(42)
//!     .build()?;
//!
//! let session = AnalysisSession::from_csv_path("data.csv", config)?;
//! println!("{}", session.preview());
//!
//! if let ActionOutcome::DetectAnomalies { detection, .. } =
//!     session.run(AnalysisAction::DetectAnomalies)?
//! {
//!     println!("Anomalies: {}", detection.anomaly_count());
//! }
//! ```
//!
//! # Lower-level use
//!
//! Each stage is usable on its own:
//!
//! ```rust,ignore
//! use smart_analytics::{AnomalyDetector, Dataset, StatisticalImputer};
//!
//! let dataset = Dataset::from_csv_path("data.csv")?;
//! let completed = StatisticalImputer::default().impute(&dataset)?.dataset;
//! let outcome = AnomalyDetector::new(0.1)?.with_seed(7).detect(&completed)?;
//! ```

pub mod anomaly;
pub mod cancellation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod imputers;
pub mod profiler;
pub mod reporting;
pub mod session;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use anomaly::{
    AnomalyDetector, AnomalyReport, DetectionOutcome, IsolationForest, LABEL_COLUMN,
};
pub use cancellation::CancellationToken;
pub use config::{
    AllMissingPolicy, AnalysisConfig, AnalysisConfigBuilder, ConfigValidationError,
};
pub use dataset::Dataset;
pub use error::{AnalyticsError, Result as AnalyticsResult, ResultExt};
pub use imputers::{ImputationResult, StatisticalImputer};
pub use profiler::{
    CategoricalSummary, CorrelationMatrix, DataProfiler, EdaSummary, Histogram, NumericSummary,
    VisualizationSummary,
};
pub use reporting::{AnalysisReport, ReportGenerator, output_base_name};
pub use session::{ActionOutcome, AnalysisAction, AnalysisSession};
pub use types::{AnomalyLabel, ColumnKind, ColumnMissing, ColumnSchema, Projection, ScatterPoint};
