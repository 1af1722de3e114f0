//! Shared helpers for column typing, parsing and statistics.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Cell contents read as missing, compared case-insensitively after trimming.
pub const MISSING_MARKERS: [&str; 8] = ["", "na", "n/a", "nan", "null", "none", "missing", "#n/a"];

/// Check if a raw cell is a missing-value marker.
///
/// ```rust,ignore
/// assert!(is_missing_marker("N/A"));
/// assert!(is_missing_marker("   "));
/// assert!(!is_missing_marker("42"));
/// ```
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a trimmed cell as a finite number.
///
/// Formatted values such as `$1,200` or `5%` do not parse.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Statistics
// =============================================================================

/// Arithmetic mean of a slice, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); 0.0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let m = mean(values).unwrap_or(0.0);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Quantile of already sorted values with linear interpolation between ranks.
///
/// `q` is clamped to `[0, 1]`. Returns `None` for an empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Sort floats ascending; NaN values are expected to be filtered beforehand.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Most frequent value with its count.
///
/// Ties resolve to the lexicographically smallest value so the result never
/// depends on hash iteration order.
pub fn mode_with_count<'a, I>(values: I) -> Option<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&'a str, usize> = HashMap::new();
    for val in values {
        *counts.entry(val).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(val, count)| (val.to_string(), count))
}

/// Calculate the mode (most frequent non-null value) of a string Series.
pub fn string_mode(series: &Series) -> Option<String> {
    let str_chunked = series.str().ok()?;
    mode_with_count(str_chunked.into_iter().flatten()).map(|(val, _)| val)
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a Float64 Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let values: Vec<f64> = series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Fill null values in a String Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let values: Vec<String> = series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

/// Collect the values of a Float64 Series, keeping nulls as `None`.
pub fn series_to_options(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    Ok(series.f64()?.into_iter().collect())
}

// =============================================================================
// Tests
// =============================================================================
