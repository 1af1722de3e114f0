//! In-memory tabular dataset with an explicit column schema.
//!
//! A [`Dataset`] pairs a polars [`DataFrame`] with a [`ColumnSchema`] per
//! column. The schema is decided once, when the data is loaded, and every
//! transformation returns a new `Dataset` instead of mutating its input.
//! Row order is never changed, so row positions can be joined back to the
//! source file.

mod loader;
mod schema;

use crate::error::{AnalyticsError, Result};
use crate::types::{AnomalyLabel, ColumnKind, ColumnSchema};
use crate::utils::series_to_options;
use ndarray::Array2;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Rows × named, typed columns.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    schema: Vec<ColumnSchema>,
}

static_assertions::assert_impl_all!(Dataset: Send, Sync);

impl Dataset {
    /// Classify every column of `frame` and normalize its physical type.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let mut columns: Vec<Column> = Vec::with_capacity(frame.width());
        let mut schema = Vec::with_capacity(frame.width());

        for column in frame.get_columns() {
            let (series, kind) = schema::normalize_column(column.as_materialized_series())?;
            schema.push(ColumnSchema::new(series.name().to_string(), kind));
            columns.push(series.into());
        }

        let frame = DataFrame::new(columns)?;
        Ok(Self { frame, schema })
    }

    /// Load a CSV file with a header row.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let dataset = Self::from_frame(loader::read_csv_path(path.as_ref())?)?;
        info!(
            rows = dataset.height(),
            columns = dataset.width(),
            numeric = dataset.numeric_columns().len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse CSV text with a header row.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        Self::from_frame(loader::read_csv_str(content)?)
    }

    /// Assemble a dataset whose columns already have canonical types.
    pub(crate) fn from_parts(frame: DataFrame, schema: Vec<ColumnSchema>) -> Self {
        debug_assert_eq!(frame.width(), schema.len());
        Self { frame, schema }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.frame.shape()
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// Fail with `InvalidInput` when there are no rows or no columns.
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.width() == 0 {
            return Err(AnalyticsError::invalid_input("dataset has no columns"));
        }
        if self.height() == 0 {
            return Err(AnalyticsError::invalid_input("dataset has no rows"));
        }
        Ok(())
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.schema.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of numeric columns, in column order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns_of_kind(ColumnKind::Numeric)
    }

    /// Names of categorical columns, in column order.
    pub fn categorical_columns(&self) -> Vec<String> {
        self.columns_of_kind(ColumnKind::Categorical)
    }

    fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.schema
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Borrow the series backing a column.
    pub fn series(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| AnalyticsError::ColumnNotFound(name.to_string()))
    }

    /// Missing cells per column, in column order.
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        self.frame
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect()
    }

    pub fn total_missing(&self) -> usize {
        self.frame.get_columns().iter().map(|c| c.null_count()).sum()
    }

    /// Values of a numeric column, `None` where missing.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.expect_kind(name, ColumnKind::Numeric)?;
        Ok(series_to_options(self.series(name)?)?)
    }

    /// Values of a categorical column, `None` where missing.
    pub fn categorical_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        self.expect_kind(name, ColumnKind::Categorical)?;
        Ok(self
            .series(name)?
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    fn expect_kind(&self, name: &str, expected: ColumnKind) -> Result<()> {
        match self.column_kind(name) {
            Some(kind) if kind == expected => Ok(()),
            Some(kind) => Err(AnalyticsError::invalid_input(format!(
                "column '{}' is {}, expected {}",
                name, kind, expected
            ))),
            None => Err(AnalyticsError::ColumnNotFound(name.to_string())),
        }
    }

    /// Row-major `(rows, columns)` matrix over the given numeric columns.
    ///
    /// Fails with `InvalidInput` if any selected cell is missing.
    pub fn feature_matrix(&self, columns: &[String]) -> Result<Array2<f64>> {
        let mut values = Vec::with_capacity(columns.len());
        for name in columns {
            let column: Option<Vec<f64>> = self.numeric_values(name)?.into_iter().collect();
            let column = column.ok_or_else(|| {
                AnalyticsError::invalid_input(format!(
                    "numeric column '{}' contains missing values; impute before detection",
                    name
                ))
            })?;
            values.push(column);
        }
        Ok(Array2::from_shape_fn(
            (self.height(), columns.len()),
            |(row, feature)| values[feature][row],
        ))
    }

    /// First `rows` rows as a plain frame, for display.
    pub fn preview(&self, rows: usize) -> DataFrame {
        self.frame.head(Some(rows))
    }

    /// Copy with a categorical label column appended.
    ///
    /// An existing column with the same name is replaced.
    pub(crate) fn with_label_column(&self, name: &str, labels: &[AnomalyLabel]) -> Result<Self> {
        if labels.len() != self.height() {
            return Err(AnalyticsError::invalid_input(format!(
                "{} labels for {} rows",
                labels.len(),
                self.height()
            )));
        }

        let mut frame = if self.column_kind(name).is_some() {
            self.frame.drop(name)?
        } else {
            self.frame.clone()
        };
        let values: Vec<&str> = labels.iter().map(AnomalyLabel::as_str).collect();
        frame.with_column(Series::new(name.into(), values))?;

        let mut schema: Vec<ColumnSchema> = self
            .schema
            .iter()
            .filter(|c| c.name != name)
            .cloned()
            .collect();
        schema.push(ColumnSchema::new(name, ColumnKind::Categorical));

        Ok(Self::from_parts(frame, schema))
    }

    /// Copy keeping only the rows at the given positions, in original order.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self> {
        let mut mask = vec![false; self.height()];
        for &row in rows {
            let slot = mask.get_mut(row).ok_or_else(|| {
                AnalyticsError::invalid_input(format!(
                    "row {} out of range for {} rows",
                    row,
                    self.height()
                ))
            })?;
            *slot = true;
        }

        let mask = BooleanChunked::from_slice("mask".into(), &mask);
        let frame = self.frame.filter(&mask)?;
        Ok(Self::from_parts(frame, self.schema.clone()))
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.frame.equals_missing(&other.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn people() -> Dataset {
        Dataset::from_csv_str("age,city,score\n25,NY,1.5\n,LA,2.5\n30,LA,\n").unwrap()
    }

    #[test]
    fn test_schema_declared_at_load() {
        let dataset = people();
        assert_eq!(
            dataset.schema(),
            &[
                ColumnSchema::new("age", ColumnKind::Numeric),
                ColumnSchema::new("city", ColumnKind::Categorical),
                ColumnSchema::new("score", ColumnKind::Numeric),
            ]
        );
        assert_eq!(dataset.numeric_columns(), vec!["age", "score"]);
        assert_eq!(dataset.categorical_columns(), vec!["city"]);
    }

    #[test]
    fn test_missing_counts() {
        let dataset = people();
        assert_eq!(
            dataset.missing_counts(),
            vec![
                ("age".to_string(), 1),
                ("city".to_string(), 0),
                ("score".to_string(), 1),
            ]
        );
        assert_eq!(dataset.total_missing(), 2);
    }

    #[test]
    fn test_numeric_values_rejects_categorical() {
        let dataset = people();
        assert_eq!(
            dataset.numeric_values("age").unwrap(),
            vec![Some(25.0), None, Some(30.0)]
        );
        assert!(matches!(
            dataset.numeric_values("city"),
            Err(AnalyticsError::InvalidInput(_))
        ));
        assert!(matches!(
            dataset.numeric_values("nope"),
            Err(AnalyticsError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_feature_matrix_requires_complete_columns() {
        let dataset = people();
        let result = dataset.feature_matrix(&["age".to_string()]);
        assert!(matches!(result, Err(AnalyticsError::InvalidInput(_))));
    }

    #[test]
    fn test_feature_matrix_layout() {
        let dataset = Dataset::from_csv_str("a,b,c\n1,10,x\n2,20,y\n3,30,z\n").unwrap();
        let x = dataset
            .feature_matrix(&["b".to_string(), "a".to_string()])
            .unwrap();

        assert_eq!(x.dim(), (3, 2));
        assert_eq!(x.row(1).to_vec(), vec![20.0, 2.0]);
        assert_eq!(x[[2, 1]], 3.0);
    }

    #[test]
    fn test_header_only_is_empty() {
        let dataset = Dataset::from_csv_str("a,b\n").unwrap();
        assert!(dataset.is_empty());
        assert!(matches!(
            dataset.ensure_not_empty(),
            Err(AnalyticsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_with_label_column_replaces_existing() {
        let dataset = Dataset::from_csv_str("x,anomaly\n1,a\n2,b\n").unwrap();
        let labeled = dataset
            .with_label_column("anomaly", &[AnomalyLabel::Normal, AnomalyLabel::Anomalous])
            .unwrap();

        assert_eq!(labeled.width(), 2);
        assert_eq!(
            labeled.categorical_values("anomaly").unwrap(),
            vec![Some("normal".to_string()), Some("anomalous".to_string())]
        );
    }

    #[test]
    fn test_select_rows_preserves_order() {
        let dataset = people();
        let subset = dataset.select_rows(&[2, 0]).unwrap();
        assert_eq!(subset.numeric_values("age").unwrap(), vec![Some(25.0), Some(30.0)]);
        assert!(dataset.select_rows(&[7]).is_err());
    }

    #[test]
    fn test_equality_is_null_aware() {
        assert_eq!(people(), people());
    }
}
