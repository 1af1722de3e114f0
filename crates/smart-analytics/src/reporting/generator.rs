use crate::anomaly::{DetectionOutcome, LABEL_COLUMN};
use crate::config::AnalysisConfig;
use crate::dataset::Dataset;
use crate::error::{Result, ResultExt};
use crate::profiler::{EdaSummary, VisualizationSummary};
use crate::session::{ActionOutcome, AnalysisAction, AnalysisSession};
use crate::types::{ColumnMissing, Projection};
use chrono::Local;
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Serializable record of one session run.
///
/// Used both for JSON on stdout (`--json`) and for the report file
/// (`--emit-report`).
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Local time the report was generated
    pub generated_at: String,
    /// Path to the input file, when the data came from one
    pub input_file: Option<String>,
    /// `(rows, columns)` of the loaded data
    pub shape: (usize, usize),
    pub action: AnalysisAction,
    pub config: AnalysisConfig,
    /// Absent for visualization, which reads the loaded data
    pub imputation: Option<ImputationSummary>,
    pub eda: Option<EdaSummary>,
    pub visualization: Option<VisualizationSummary>,
    pub detection: Option<DetectionSummary>,
    /// Notice explaining a skipped view
    pub notice: Option<String>,
    /// Files written alongside the report
    pub output_files: Vec<String>,
}

/// What imputation did before the action ran.
#[derive(Debug, Clone, Serialize)]
pub struct ImputationSummary {
    pub missing_report: Vec<ColumnMissing>,
    pub steps: Vec<String>,
    pub warnings: Vec<String>,
}

/// Detection results without the labeled data itself.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionSummary {
    pub contamination: f64,
    pub anomaly_count: usize,
    pub anomalous_rows: Vec<usize>,
    /// Score cut-off; `None` when no model was fitted
    pub threshold: Option<f64>,
    pub numeric_columns: Vec<String>,
    /// Numeric columns left out for having no values
    pub skipped_columns: Vec<String>,
    pub projection: Option<Projection>,
}

// ============================================================================
// Generator
// ============================================================================

/// Writes reports and derived datasets into an output directory.
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build the report for `outcome`, produced by `session`.
    pub fn build_report(session: &AnalysisSession, outcome: &ActionOutcome) -> AnalysisReport {
        let imputation = outcome.imputation().map(|imputation| ImputationSummary {
            missing_report: imputation.missing_report.clone(),
            steps: imputation.steps.clone(),
            warnings: imputation.warnings.clone(),
        });

        let (eda, visualization, detection) = match outcome {
            ActionOutcome::Eda { summary, .. } => (Some(summary.clone()), None, None),
            ActionOutcome::Visualize { summary, .. } => (None, Some(summary.clone()), None),
            ActionOutcome::DetectAnomalies { detection, .. } => (
                None,
                None,
                Some(Self::detection_summary(session.config(), detection)),
            ),
        };

        AnalysisReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: session.source().map(|p| p.display().to_string()),
            shape: session.dataset().shape(),
            action: outcome.action(),
            config: session.config().clone(),
            imputation,
            eda,
            visualization,
            detection,
            notice: outcome.notice().map(String::from),
            output_files: Vec::new(),
        }
    }

    fn detection_summary(
        config: &AnalysisConfig,
        detection: &DetectionOutcome,
    ) -> DetectionSummary {
        match detection.report() {
            Some(report) => DetectionSummary {
                contamination: config.contamination,
                anomaly_count: report.anomaly_count,
                anomalous_rows: report.anomalous_rows.clone(),
                threshold: Some(report.threshold),
                numeric_columns: report.numeric_columns.clone(),
                skipped_columns: report.skipped_columns.clone(),
                projection: report.projection.clone(),
            },
            None => DetectionSummary {
                contamination: config.contamination,
                anomaly_count: 0,
                anomalous_rows: Vec::new(),
                threshold: None,
                numeric_columns: Vec::new(),
                skipped_columns: Vec::new(),
                projection: None,
            },
        }
    }

    /// Write `report` as pretty JSON to `<base_name>_report.json`.
    pub fn write_report_to_file(
        &self,
        report: &AnalysisReport,
        base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(format!("{}_report.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }

    /// Write a dataset as CSV to `<file_name>.csv`.
    pub fn write_dataset_csv(&self, dataset: &Dataset, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let output_path = self.output_dir.join(format!("{}.csv", file_name));
        let mut frame = dataset.frame().clone();
        Self::write_frame(&mut frame, &output_path)?;

        info!("Dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Write the scatter projection to `<base_name>_projection.csv` with
    /// columns `row`, the two projected columns and the label.
    pub fn write_projection_csv(
        &self,
        projection: &Projection,
        base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let rows: Vec<u64> = projection.points.iter().map(|p| p.row as u64).collect();
        let xs: Vec<f64> = projection.points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = projection.points.iter().map(|p| p.y).collect();
        let labels: Vec<&str> = projection.points.iter().map(|p| p.label.as_str()).collect();

        let mut frame = DataFrame::new(vec![
            Series::new("row".into(), rows).into(),
            Series::new(projection.x_column.as_str().into(), xs).into(),
            Series::new(projection.y_column.as_str().into(), ys).into(),
            Series::new(LABEL_COLUMN.into(), labels).into(),
        ])
        .context("Failed to assemble projection table")?;

        let output_path = self.output_dir.join(format!("{}_projection.csv", base_name));
        Self::write_frame(&mut frame, &output_path)?;

        info!("Projection saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Write the data files derived from `outcome`: the labeled dataset and
    /// the projection after detection. Other actions produce no data files.
    pub fn write_outputs(&self, outcome: &ActionOutcome, base_name: &str) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if let ActionOutcome::DetectAnomalies { detection, .. } = outcome
            && let Some(report) = detection.report()
        {
            let labeled_name = format!("{}_labeled", base_name);
            written.push(self.write_dataset_csv(&report.labeled, &labeled_name)?);
            if let Some(projection) = &report.projection {
                written.push(self.write_projection_csv(projection, base_name)?);
            }
        }
        Ok(written)
    }

    fn write_frame(frame: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(frame)?;
        Ok(())
    }
}

/// Base name for output files derived from an input path, e.g. `sales` for
/// `data/sales.csv`.
pub fn output_base_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "dataset".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("smart_analytics_{}_{}", tag, nanos))
    }

    fn detection_session() -> AnalysisSession {
        let csv: String = std::iter::once("x,y,tag\n".to_string())
            .chain((0..30).map(|i| format!("{},{},t{}\n", i, (i * 3) % 7, i % 3)))
            .collect();
        AnalysisSession::new(Dataset::from_csv_str(&csv).unwrap(), AnalysisConfig::default())
            .unwrap()
    }

    #[test]
    fn test_output_base_name() {
        assert_eq!(output_base_name(Path::new("data/sales.csv")), "sales");
        assert_eq!(output_base_name(Path::new("")), "dataset");
    }

    #[test]
    fn test_build_report_for_detection() {
        let session = detection_session();
        let outcome = session.run(AnalysisAction::DetectAnomalies).unwrap();
        let report = ReportGenerator::build_report(&session, &outcome);

        assert_eq!(report.action, AnalysisAction::DetectAnomalies);
        assert_eq!(report.shape, (30, 3));
        assert!(report.eda.is_none());
        let detection = report.detection.as_ref().unwrap();
        assert_eq!(detection.anomaly_count, detection.anomalous_rows.len());
        assert!(detection.threshold.is_some());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["action"], "detect_anomalies");
        assert_eq!(json["config"]["random_seed"], 42);
    }

    #[test]
    fn test_write_report_and_outputs() {
        let dir = temp_dir("outputs");
        let generator = ReportGenerator::new(&dir);
        let session = detection_session();
        let outcome = session.run(AnalysisAction::DetectAnomalies).unwrap();

        let written = generator.write_outputs(&outcome, "demo").unwrap();
        assert_eq!(written.len(), 2);
        assert!(dir.join("demo_labeled.csv").exists());
        assert!(dir.join("demo_projection.csv").exists());

        let labeled = fs::read_to_string(dir.join("demo_labeled.csv")).unwrap();
        assert!(labeled.starts_with("x,y,tag,anomaly"));
        let projection = fs::read_to_string(dir.join("demo_projection.csv")).unwrap();
        assert!(projection.starts_with("row,x,y,anomaly"));

        let report = ReportGenerator::build_report(&session, &outcome);
        let path = generator.write_report_to_file(&report, "demo").unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed["shape"], serde_json::json!([30, 3]));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_eda_writes_no_data_files() {
        let dir = temp_dir("eda");
        let generator = ReportGenerator::new(&dir);
        let session = detection_session();
        let outcome = session.run(AnalysisAction::Eda).unwrap();

        assert!(generator.write_outputs(&outcome, "demo").unwrap().is_empty());
        fs::remove_dir_all(&dir).ok();
    }
}
