//! CSV ingestion with fallback strategies.

use crate::error::{AnalyticsError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Rows polars inspects to infer column dtypes on the first attempt.
const INFER_SCHEMA_ROWS: usize = 100;

/// Read a CSV file with a header row.
pub(crate) fn read_csv_path(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(AnalyticsError::invalid_input(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    info!("Loading dataset from: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    read_csv_str(&content)
}

/// Read CSV text with a header row.
///
/// Strategy 1 lets polars infer dtypes from the leading rows. If that fails
/// (typically a column whose later rows contradict the inferred dtype), the
/// text is cleaned and read again with every column as a string; column
/// kinds are then decided by [`normalize_column`](super::schema::normalize_column).
pub(crate) fn read_csv_str(content: &str) -> Result<DataFrame> {
    if content.trim().is_empty() {
        return Err(AnalyticsError::invalid_input("CSV input is empty"));
    }

    match CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(Cursor::new(content.to_string()))
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    let cleaned = clean_csv_content(content);
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .map_err(|e| AnalyticsError::invalid_input(format!("Malformed CSV: {}", e)))
}

/// Drop blank lines and trailing carriage returns.
fn clean_csv_content(content: &str) -> String {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
