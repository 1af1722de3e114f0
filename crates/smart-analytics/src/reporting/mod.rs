//! Report generation and export.
//!
//! [`AnalysisReport`] is the single serializable record of a session run,
//! suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use smart_analytics::{AnalysisAction, AnalysisConfig, AnalysisSession, ReportGenerator};
//!
//! let session = AnalysisSession::from_csv_path("data/sales.csv", AnalysisConfig::default())?;
//! let outcome = session.run(AnalysisAction::DetectAnomalies)?;
//!
//! let generator = ReportGenerator::new("outputs");
//! generator.write_outputs(&outcome, "sales")?;
//! let report = ReportGenerator::build_report(&session, &outcome);
//! generator.write_report_to_file(&report, "sales")?;
//! ```

mod generator;

pub use generator::{
    AnalysisReport, DetectionSummary, ImputationSummary, ReportGenerator, output_base_name,
};
