//! Column classification at load time.
//!
//! Every column leaves here in one of two physical shapes: `Float64` for
//! [`ColumnKind::Numeric`] and `String` for [`ColumnKind::Categorical`].
//! Downstream code relies on that and never re-inspects runtime types.

use crate::error::Result;
use crate::types::ColumnKind;
use crate::utils::{is_missing_marker, is_numeric_dtype, parse_numeric_string};
use polars::prelude::*;
use tracing::debug;

/// Classify a raw column and convert it to its canonical physical type.
pub(crate) fn normalize_column(series: &Series) -> Result<(Series, ColumnKind)> {
    let dtype = series.dtype();

    if is_numeric_dtype(dtype) {
        let floats = series.cast(&DataType::Float64)?;
        return Ok((nan_to_null(&floats)?, ColumnKind::Numeric));
    }

    if dtype == &DataType::String {
        if looks_numeric(series)? {
            debug!(column = %series.name(), "String column parsed as numeric");
            return Ok((parse_string_column(series)?, ColumnKind::Numeric));
        }
        return Ok((markers_to_null(series)?, ColumnKind::Categorical));
    }

    // Booleans, dates and anything else are treated as labels.
    let as_text = series.cast(&DataType::String)?;
    Ok((markers_to_null(&as_text)?, ColumnKind::Categorical))
}

/// A string column is numeric when it holds at least one value and every
/// value that is not a missing marker parses as a number.
fn looks_numeric(series: &Series) -> Result<bool> {
    let mut seen_value = false;
    for val in series.str()?.into_iter().flatten() {
        if is_missing_marker(val) {
            continue;
        }
        if parse_numeric_string(val).is_none() {
            return Ok(false);
        }
        seen_value = true;
    }
    Ok(seen_value)
}

fn parse_string_column(series: &Series) -> Result<Series> {
    let values: Vec<Option<f64>> = series
        .str()?
        .into_iter()
        .map(|opt| opt.and_then(parse_numeric_string))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

fn markers_to_null(series: &Series) -> Result<Series> {
    let values: Vec<Option<&str>> = series
        .str()?
        .into_iter()
        .map(|opt| opt.filter(|val| !is_missing_marker(val)))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

fn nan_to_null(series: &Series) -> Result<Series> {
    let values: Vec<Option<f64>> = series
        .f64()?
        .into_iter()
        .map(|opt| opt.filter(|val| val.is_finite()))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(series: &Series) -> Vec<Option<f64>> {
        series.f64().unwrap().into_iter().collect()
    }

    fn strings(series: &Series) -> Vec<Option<String>> {
        series
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_integer_column_is_numeric() {
        let series = Series::new("age".into(), &[Some(25i64), None, Some(30)]);
        let (normalized, kind) = normalize_column(&series).unwrap();

        assert_eq!(kind, ColumnKind::Numeric);
        assert_eq!(normalized.dtype(), &DataType::Float64);
        assert_eq!(floats(&normalized), vec![Some(25.0), None, Some(30.0)]);
    }

    #[test]
    fn test_nan_becomes_missing() {
        let series = Series::new("x".into(), &[1.0f64, f64::NAN, 3.0]);
        let (normalized, _) = normalize_column(&series).unwrap();
        assert_eq!(normalized.null_count(), 1);
    }

    #[test]
    fn test_string_column_with_markers_is_numeric() {
        let series = Series::new("price".into(), &[Some("1200"), Some("NA"), Some(" 15.5"), None]);
        let (normalized, kind) = normalize_column(&series).unwrap();

        assert_eq!(kind, ColumnKind::Numeric);
        assert_eq!(floats(&normalized), vec![Some(1200.0), None, Some(15.5), None]);
    }

    #[test]
    fn test_formatted_numbers_are_categorical() {
        let series = Series::new("rate".into(), &["5%", "10%", "$7"]);
        let (normalized, kind) = normalize_column(&series).unwrap();

        assert_eq!(kind, ColumnKind::Categorical);
        assert_eq!(
            strings(&normalized),
            vec![Some("5%".to_string()), Some("10%".to_string()), Some("$7".to_string())]
        );
    }

    #[test]
    fn test_text_column_is_categorical() {
        let series = Series::new("city".into(), &[Some("NY"), Some("n/a"), Some("LA"), None]);
        let (normalized, kind) = normalize_column(&series).unwrap();

        assert_eq!(kind, ColumnKind::Categorical);
        assert_eq!(
            strings(&normalized),
            vec![Some("NY".to_string()), None, Some("LA".to_string()), None]
        );
    }

    #[test]
    fn test_mixed_text_and_numbers_is_categorical() {
        let series = Series::new("code".into(), &["1", "2", "A3"]);
        let (_, kind) = normalize_column(&series).unwrap();
        assert_eq!(kind, ColumnKind::Categorical);
    }

    #[test]
    fn test_all_missing_strings_is_categorical() {
        let series = Series::new("empty".into(), &[Option::<&str>::None, Some("NA")]);
        let (normalized, kind) = normalize_column(&series).unwrap();

        assert_eq!(kind, ColumnKind::Categorical);
        assert_eq!(normalized.null_count(), 2);
    }

    #[test]
    fn test_boolean_column_is_categorical() {
        let series = Series::new("flag".into(), &[true, false, true]);
        let (normalized, kind) = normalize_column(&series).unwrap();

        assert_eq!(kind, ColumnKind::Categorical);
        assert_eq!(normalized.dtype(), &DataType::String);
    }
}
