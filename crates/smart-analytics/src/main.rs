//! CLI entry point for smart data analytics.

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use smart_analytics::{
    ActionOutcome, AllMissingPolicy, AnalysisAction, AnalysisConfig, AnalysisReport,
    AnalysisSession, AnalyticsError, AnalyticsResult, DetectionOutcome, EdaSummary,
    ImputationResult, ReportGenerator, VisualizationSummary, output_base_name,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible analysis action enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliAction {
    /// Descriptive statistics, correlations and histograms
    Eda,
    /// Correlation matrix and scatter pairs for plotting
    Visualize,
    /// Isolation-forest anomaly detection
    Detect,
}

impl From<CliAction> for AnalysisAction {
    fn from(cli: CliAction) -> Self {
        match cli {
            CliAction::Eda => AnalysisAction::Eda,
            CliAction::Visualize => AnalysisAction::Visualize,
            CliAction::Detect => AnalysisAction::DetectAnomalies,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Smart Data Analytics: EDA and anomaly detection for CSV files",
    long_about = "Load a CSV file, fill missing values and run one analysis over it.\n\n\
                  EXAMPLES:\n  \
                  # Detect anomalies with the default 5% contamination\n  \
                  smart-analytics -i data.csv --action detect\n\n  \
                  # Exploratory summary as JSON\n  \
                  smart-analytics -i data.csv --action eda --json\n\n  \
                  # Write the report, labeled data and projection to results/\n  \
                  smart-analytics -i data.csv --contamination 0.1 -o results/ --emit-report"
)]
struct Args {
    /// Path to the CSV file to analyse
    #[arg(short, long)]
    input: String,

    /// Analysis to run
    #[arg(short, long, value_enum, default_value = "detect")]
    action: CliAction,

    /// Expected share of anomalous rows, in (0, 0.2]
    #[arg(short, long, default_value = "0.05")]
    contamination: f64,

    /// Random seed for the isolation forest
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Number of isolation trees
    #[arg(long, default_value = "100")]
    estimators: usize,

    /// Maximum rows sampled per tree
    #[arg(long, default_value = "256")]
    max_samples: usize,

    /// Leave columns without any value missing instead of failing
    #[arg(long)]
    leave_missing: bool,

    /// Output directory for reports and exported data
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Write a JSON report to the output directory
    ///
    /// The report is saved as <input_name>_report.json. After detection the
    /// labeled dataset and projection are written next to it.
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all logs; only the final JSON report is printed.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings, errors and the final result
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // .env first so RUST_LOG set there reaches the filter
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    let session = match open_session(&args) {
        Ok(session) => session,
        Err(e) => return report_failure("Loading", e, args.json),
    };

    let action = AnalysisAction::from(args.action);
    match session.run(action) {
        Ok(outcome) => handle_output(&session, &outcome, &args),
        Err(e) => report_failure("Analysis", e, args.json),
    }
}

/// Validate the CLI configuration and load the input file.
fn open_session(args: &Args) -> AnalyticsResult<AnalysisSession> {
    let policy = if args.leave_missing {
        AllMissingPolicy::LeaveMissing
    } else {
        AllMissingPolicy::Fail
    };
    let config = AnalysisConfig::builder()
        .contamination(args.contamination)
        .random_seed(args.seed)
        .n_estimators(args.estimators)
        .max_samples(args.max_samples)
        .all_missing_policy(policy)
        .build()?;

    AnalysisSession::from_csv_path(&args.input, config)
}

fn error_json(e: &AnalyticsError) -> serde_json::Value {
    serde_json::json!({ "error": e })
}

/// Log a failure and, with `--json`, print it as `{"error": {code, message}}`.
fn report_failure(stage: &str, e: AnalyticsError, json_output: bool) -> Result<()> {
    error!("{} failed: {}", stage, e);
    if json_output {
        println!("{}", serde_json::to_string_pretty(&error_json(&e))?);
    }
    Err(anyhow!("{} failed: {}", stage, e))
}

/// Handle session output based on CLI flags.
///
/// - Default: human-readable summary on stdout
/// - `--json`: JSON report on stdout only
/// - `--emit-report`: report and exported data written to the output directory
fn handle_output(session: &AnalysisSession, outcome: &ActionOutcome, args: &Args) -> Result<()> {
    let mut report = ReportGenerator::build_report(session, outcome);

    if args.emit_report {
        let base_name = output_base_name(Path::new(&args.input));
        let generator = ReportGenerator::new(PathBuf::from(&args.output));

        let written = generator.write_outputs(outcome, &base_name)?;
        report.output_files = written.iter().map(|p| p.display().to_string()).collect();

        let report_path = generator.write_report_to_file(&report, &base_name)?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(session, outcome, &report);
    Ok(())
}

/// Print the default, human-readable output.
///
/// Uses `println!` on purpose: this is the program's result, not a log line.
fn print_human_readable_summary(
    session: &AnalysisSession,
    outcome: &ActionOutcome,
    report: &AnalysisReport,
) {
    println!();
    println!("{}", "=".repeat(80));
    println!("SMART DATA ANALYTICS: {}", report.action.as_str().to_uppercase());
    println!("{}", "=".repeat(80));
    println!();

    println!("  Input:   {}", report.input_file.as_deref().unwrap_or("-"));
    println!("  Shape:   {} rows x {} columns", report.shape.0, report.shape.1);
    println!();

    println!("DATASET PREVIEW");
    println!("{}", "-".repeat(40));
    println!("{}", session.preview());
    println!();

    if let Some(imputation) = outcome.imputation() {
        print_imputation(imputation);
    }

    match outcome {
        ActionOutcome::Eda { summary, .. } => print_eda(summary),
        ActionOutcome::Visualize { summary, .. } => print_visualization(summary),
        ActionOutcome::DetectAnomalies { detection, .. } => print_detection(detection),
    }

    if !report.output_files.is_empty() {
        println!("FILES WRITTEN");
        println!("{}", "-".repeat(40));
        for file in &report.output_files {
            println!("  {}", file);
        }
        println!();
    }
}

fn print_imputation(imputation: &ImputationResult) {
    println!("MISSING VALUES");
    println!("{}", "-".repeat(40));
    println!("{:<24} {:<12} {:>8} {:>8}", "Column", "Type", "Before", "After");
    for column in &imputation.missing_report {
        println!(
            "{:<24} {:<12} {:>8} {:>8}",
            truncate_str(&column.column, 23),
            column.kind.as_str(),
            column.missing_before,
            column.missing_after
        );
    }
    for step in &imputation.steps {
        println!("  - {}", step);
    }
    for warning in &imputation.warnings {
        println!("  ! {}", warning);
    }
    println!();
}

fn print_eda(summary: &EdaSummary) {
    if let Some(notice) = &summary.notice {
        println!("{}", notice);
        println!();
    }

    if !summary.numeric.is_empty() {
        println!("NUMERIC SUMMARY");
        println!("{}", "-".repeat(40));
        println!(
            "{:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            "Column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        );
        for s in &summary.numeric {
            println!(
                "{:<20} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
                truncate_str(&s.column, 19),
                s.count,
                fmt_stat(s.mean),
                fmt_stat(s.std),
                fmt_stat(s.min),
                fmt_stat(s.q25),
                fmt_stat(s.median),
                fmt_stat(s.q75),
                fmt_stat(s.max)
            );
        }
        println!();
    }

    if !summary.categorical.is_empty() {
        println!("CATEGORICAL SUMMARY");
        println!("{}", "-".repeat(40));
        println!("{:<20} {:>6} {:>8} {:<20} {:>6}", "Column", "count", "unique", "top", "freq");
        for s in &summary.categorical {
            println!(
                "{:<20} {:>6} {:>8} {:<20} {:>6}",
                truncate_str(&s.column, 19),
                s.count,
                s.unique,
                truncate_str(s.top.as_deref().unwrap_or("-"), 19),
                s.freq
            );
        }
        println!();
    }

    if let Some(correlation) = &summary.correlation {
        print_strongest_correlations(correlation);
    }
}

fn print_visualization(summary: &VisualizationSummary) {
    if let Some(notice) = &summary.notice {
        println!("{}", notice);
        println!();
        return;
    }

    if let Some(correlation) = &summary.correlation {
        print_strongest_correlations(correlation);
    }

    println!("SCATTER PAIRS ({})", summary.scatter_pairs.len());
    println!("{}", "-".repeat(40));
    for (a, b) in &summary.scatter_pairs {
        println!("  {} vs {}", a, b);
    }
    println!();
}

fn print_strongest_correlations(correlation: &smart_analytics::CorrelationMatrix) {
    let pairs = correlation.strongest_pairs(10);
    if pairs.is_empty() {
        return;
    }
    println!("STRONGEST CORRELATIONS");
    println!("{}", "-".repeat(40));
    for (a, b, r) in pairs {
        println!("  {:<20} {:<20} {:>7.3}", truncate_str(&a, 19), truncate_str(&b, 19), r);
    }
    println!();
}

fn print_detection(detection: &DetectionOutcome) {
    println!("ANOMALY DETECTION");
    println!("{}", "-".repeat(40));

    let Some(report) = detection.report() else {
        if let Some(notice) = detection.notice() {
            println!("  {}", notice);
        }
        println!();
        return;
    };

    println!("  Features:  {}", report.numeric_columns.join(", "));
    println!("  Threshold: {:.4}", report.threshold);
    println!("  Anomalies: {} of {} rows", report.anomaly_count, report.labels.len());
    println!();

    if report.anomaly_count > 0 {
        println!("ANOMALOUS ROWS");
        println!("{}", "-".repeat(40));
        println!("{}", report.anomalies.frame());
        println!();
    }

    match &report.projection {
        Some(projection) => {
            println!(
                "  Projection: {} vs {} ({} anomalous points)",
                projection.x_column,
                projection.y_column,
                projection.anomalous_points().count()
            );
        }
        None => {
            if let Some(notice) = &report.notice {
                println!("  {}", notice);
            }
        }
    }
    println!();
}

fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.3}", v),
        _ => "-".to_string(),
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_fails_while_loading() {
        let args = Args::parse_from(["smart-analytics", "-i", "no_such_dir/no_such_file.csv"]);
        let err = open_session(&args).unwrap_err();

        assert!(matches!(err, AnalyticsError::InvalidInput(_)));
        let json = error_json(&err);
        assert_eq!(json["error"]["code"], "INVALID_INPUT");
        assert!(json["error"]["message"].as_str().unwrap().contains("not found"));
    }

    #[test]
    fn test_bad_contamination_fails_before_loading() {
        let args = Args::parse_from(["smart-analytics", "-i", "data.csv", "-c", "0.5"]);
        let err = open_session(&args).unwrap_err();
        assert_eq!(error_json(&err)["error"]["code"], "INVALID_INPUT");
    }
}
