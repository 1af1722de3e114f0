//! Analysis session: one loaded dataset, one configuration, one action per call.

use crate::anomaly::{AnomalyDetector, DetectionOutcome};
use crate::cancellation::CancellationToken;
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::{AnalyticsError, Result};
use crate::imputers::{ImputationResult, StatisticalImputer};
use crate::profiler::{DataProfiler, EdaSummary, VisualizationSummary};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

/// Analysis a user can request for the loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisAction {
    Eda,
    Visualize,
    DetectAnomalies,
}

impl AnalysisAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eda => "eda",
            Self::Visualize => "visualize",
            Self::DetectAnomalies => "detect_anomalies",
        }
    }
}

impl fmt::Display for AnalysisAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisAction {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "eda" => Ok(Self::Eda),
            "visualize" | "visualization" => Ok(Self::Visualize),
            "detect" | "detect_anomalies" | "anomaly" | "anomalies" => Ok(Self::DetectAnomalies),
            other => Err(AnalyticsError::invalid_input(format!(
                "unknown action '{}'",
                other
            ))),
        }
    }
}

/// What a single [`AnalysisSession::run`] produced.
///
/// EDA and detection work on the completed dataset and carry the imputation
/// that preceded them. Visualization reads the loaded data as is.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    Eda {
        imputation: ImputationResult,
        summary: EdaSummary,
    },
    Visualize {
        summary: VisualizationSummary,
    },
    DetectAnomalies {
        imputation: ImputationResult,
        detection: DetectionOutcome,
    },
}

impl ActionOutcome {
    pub fn action(&self) -> AnalysisAction {
        match self {
            Self::Eda { .. } => AnalysisAction::Eda,
            Self::Visualize { .. } => AnalysisAction::Visualize,
            Self::DetectAnomalies { .. } => AnalysisAction::DetectAnomalies,
        }
    }

    /// Imputation run before the action; `None` for visualization.
    pub fn imputation(&self) -> Option<&ImputationResult> {
        match self {
            Self::Eda { imputation, .. } | Self::DetectAnomalies { imputation, .. } => {
                Some(imputation)
            }
            Self::Visualize { .. } => None,
        }
    }

    /// Notice explaining a skipped view, if any.
    pub fn notice(&self) -> Option<&str> {
        match self {
            Self::Eda { summary, .. } => summary.notice.as_deref(),
            Self::Visualize { summary, .. } => summary.notice.as_deref(),
            Self::DetectAnomalies { detection, .. } => detection.notice(),
        }
    }
}

/// Explicit context for analysing one dataset.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    dataset: Dataset,
    config: AnalysisConfig,
    source: Option<PathBuf>,
}

impl AnalysisSession {
    /// # Errors
    ///
    /// `InvalidInput`/`InvalidConfig` if `config` does not validate.
    pub fn new(dataset: Dataset, config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dataset,
            config,
            source: None,
        })
    }

    /// Load a CSV file and open a session on it.
    pub fn from_csv_path(path: impl AsRef<Path>, config: AnalysisConfig) -> Result<Self> {
        let path = path.as_ref();
        config.validate()?;
        let dataset = Dataset::from_csv_path(path)?;
        Ok(Self {
            dataset,
            config,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// File the dataset was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// First `preview_rows` rows of the loaded data.
    pub fn preview(&self) -> DataFrame {
        self.dataset.preview(self.config.preview_rows)
    }

    pub fn impute(&self) -> Result<ImputationResult> {
        StatisticalImputer::from_config(&self.config).impute(&self.dataset)
    }

    /// Run `action` on the loaded dataset.
    pub fn run(&self, action: AnalysisAction) -> Result<ActionOutcome> {
        self.run_inner(action, None)
    }

    /// Like [`run`](Self::run); detection stops with `Cancelled` once `token`
    /// is cancelled.
    pub fn run_with_cancellation(
        &self,
        action: AnalysisAction,
        token: &CancellationToken,
    ) -> Result<ActionOutcome> {
        self.run_inner(action, Some(token))
    }

    fn run_inner(
        &self,
        action: AnalysisAction,
        token: Option<&CancellationToken>,
    ) -> Result<ActionOutcome> {
        let start = Instant::now();
        let profiler = DataProfiler::from_config(&self.config);

        let outcome = match action {
            AnalysisAction::Eda => {
                let imputation = self.impute()?;
                let summary = profiler.eda(&imputation.dataset)?;
                ActionOutcome::Eda {
                    imputation,
                    summary,
                }
            }
            AnalysisAction::Visualize => ActionOutcome::Visualize {
                summary: profiler.visualize(&self.dataset)?,
            },
            AnalysisAction::DetectAnomalies => {
                let imputation = self.impute()?;
                let mut detector = AnomalyDetector::from_config(&self.config)?;
                if let Some(token) = token {
                    detector = detector.with_cancellation_token(token.clone());
                }
                let detection = detector.detect(&imputation.dataset)?;
                ActionOutcome::DetectAnomalies {
                    imputation,
                    detection,
                }
            }
        };

        info!(
            action = %action,
            duration_ms = start.elapsed().as_millis() as u64,
            "Action complete"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllMissingPolicy;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn session(csv: &str) -> AnalysisSession {
        AnalysisSession::new(Dataset::from_csv_str(csv).unwrap(), AnalysisConfig::default())
            .unwrap()
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("EDA".parse::<AnalysisAction>().unwrap(), AnalysisAction::Eda);
        assert_eq!(
            "detect".parse::<AnalysisAction>().unwrap(),
            AnalysisAction::DetectAnomalies
        );
        assert!("plot".parse::<AnalysisAction>().is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dataset = Dataset::from_csv_str("a\n1\n2\n").unwrap();
        let config = AnalysisConfig {
            contamination: 0.3,
            ..AnalysisConfig::default()
        };
        let err = AnalysisSession::new(dataset, config).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
    }

    #[test]
    fn test_preview_rows() {
        let csv: String = std::iter::once("a,b\n".to_string())
            .chain((0..10).map(|i| format!("{},{}\n", i, i * 2)))
            .collect();
        let session = session(&csv);

        assert_eq!(session.preview().height(), 5);
        assert_eq!(session.dataset().height(), 10);
    }

    #[test]
    fn test_eda_runs_on_completed_data() {
        let session = session("age,city\n25,NY\n,LA\n30,LA\n");
        let outcome = session.run(AnalysisAction::Eda).unwrap();

        assert_eq!(outcome.action(), AnalysisAction::Eda);
        assert_eq!(outcome.imputation().unwrap().remaining_missing(), 0);
        match outcome {
            ActionOutcome::Eda { summary, .. } => {
                assert_eq!(summary.numeric[0].count, 3);
                assert_eq!(summary.numeric[0].mean, Some(27.5));
            }
            other => panic!("unexpected outcome: {:?}", other.action()),
        }
    }

    #[test]
    fn test_detect_without_numeric_columns() {
        let session = session("city,color\nNY,red\nLA,blue\nSF,red\n");
        let outcome = session.run(AnalysisAction::DetectAnomalies).unwrap();
        assert_eq!(
            outcome.notice(),
            Some("No numeric columns available for anomaly detection.")
        );
    }

    #[test]
    fn test_detect_imputes_first() {
        let session = session("a,b\n1,2\n,3\n4,\n5,6\n7,8\n");
        let outcome = session.run(AnalysisAction::DetectAnomalies).unwrap();
        match outcome {
            ActionOutcome::DetectAnomalies { detection, .. } => {
                let report = detection.report().unwrap();
                assert_eq!(report.labeled.height(), 5);
            }
            other => panic!("unexpected outcome: {:?}", other.action()),
        }
    }

    #[test]
    fn test_run_with_cancelled_token() {
        let session = session("a,b\n1,2\n3,4\n5,6\n");
        let token = CancellationToken::new();
        token.cancel();

        let err = session
            .run_with_cancellation(AnalysisAction::DetectAnomalies, &token)
            .unwrap_err();
        assert!(err.is_cancelled());

        // Profiling never consults the token.
        assert!(session.run_with_cancellation(AnalysisAction::Eda, &token).is_ok());
    }

    #[test]
    fn test_leave_missing_policy_flows_through() {
        let dataset = Dataset::from_csv_str("a,b\n1,\n2,\n").unwrap();
        let strict = AnalysisSession::new(dataset.clone(), AnalysisConfig::default()).unwrap();
        assert!(strict.run(AnalysisAction::Eda).is_err());

        let config = AnalysisConfig {
            all_missing_policy: AllMissingPolicy::LeaveMissing,
            ..AnalysisConfig::default()
        };
        let lenient = AnalysisSession::new(dataset, config).unwrap();
        let outcome = lenient.run(AnalysisAction::Eda).unwrap();
        assert_eq!(outcome.imputation().unwrap().warnings.len(), 1);
    }

    #[test]
    fn test_visualize_reads_loaded_data() {
        // An empty column would fail imputation under the default policy.
        let session = session("a,b,note\n1,1,\n2,2,\n3,,\n4,4,\n10,10,\n");
        let outcome = session.run(AnalysisAction::Visualize).unwrap();

        assert!(outcome.imputation().is_none());
        let ActionOutcome::Visualize { summary } = outcome else {
            panic!("expected visualization outcome");
        };
        let correlation = summary.correlation.unwrap();
        // Row 2 has no `b`, so only complete pairs count.
        assert!((correlation.get("a", "b").unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_leave_missing_detection_skips_empty_column() {
        let a: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..20).map(|i| ((i * 7) % 11) as f64).collect();
        let c: Vec<Option<f64>> = vec![None; 20];
        let frame = df!("a" => a, "b" => b, "c" => c).unwrap();
        let config = AnalysisConfig {
            all_missing_policy: AllMissingPolicy::LeaveMissing,
            ..AnalysisConfig::default()
        };
        let session = AnalysisSession::new(Dataset::from_frame(frame).unwrap(), config).unwrap();

        let outcome = session.run(AnalysisAction::DetectAnomalies).unwrap();
        let ActionOutcome::DetectAnomalies { detection, .. } = outcome else {
            panic!("expected detection outcome");
        };
        let report = detection.report().unwrap();
        assert_eq!(report.numeric_columns, vec!["a", "b"]);
        assert_eq!(report.skipped_columns, vec!["c"]);
    }
}
