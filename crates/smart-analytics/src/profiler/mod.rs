//! Exploratory profiling of a dataset.
//!
//! This module produces the data behind the EDA and visualization views:
//! - Descriptive statistics for numeric columns
//! - Count/unique/top/freq summaries for categorical columns
//! - Pearson correlation matrix
//! - Equal-width histograms
//!
//! Nothing here renders; callers print or plot the returned structures.

mod correlation;
mod statistics;

pub use correlation::CorrelationMatrix;
pub use statistics::{CategoricalSummary, Histogram, NumericSummary};

use crate::config::{AnalysisConfig, DEFAULT_HISTOGRAM_BINS};
use crate::dataset::Dataset;
use crate::error::Result;
use serde::Serialize;
use tracing::debug;

pub const NO_NUMERIC_EDA_NOTICE: &str = "No numeric columns available for EDA.";

pub const NO_NUMERIC_VISUALIZATION_NOTICE: &str = "No numeric columns available for visualization.";

/// Statistics for the EDA view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdaSummary {
    /// `(rows, columns)`.
    pub shape: (usize, usize),
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
    /// `None` when there are no numeric columns.
    pub correlation: Option<CorrelationMatrix>,
    pub histograms: Vec<Histogram>,
    pub notice: Option<String>,
}

/// Data for the visualization view: heatmap, pairwise scatter plots and
/// distributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationSummary {
    pub correlation: Option<CorrelationMatrix>,
    /// Every unordered pair of numeric columns, in column order.
    pub scatter_pairs: Vec<(String, String)>,
    pub histograms: Vec<Histogram>,
    pub notice: Option<String>,
}

/// Computes EDA and visualization summaries.
#[derive(Debug, Clone, Copy)]
pub struct DataProfiler {
    histogram_bins: usize,
}

impl Default for DataProfiler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTOGRAM_BINS)
    }
}

impl DataProfiler {
    pub fn new(histogram_bins: usize) -> Self {
        Self {
            histogram_bins: histogram_bins.max(1),
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.histogram_bins)
    }

    /// Summarize every column of `dataset`.
    pub fn eda(&self, dataset: &Dataset) -> Result<EdaSummary> {
        dataset.ensure_not_empty()?;

        let numeric_values = Self::numeric_columns(dataset)?;
        let numeric = numeric_values
            .iter()
            .map(|(name, values)| statistics::describe_numeric(name, values))
            .collect();

        let mut categorical = Vec::new();
        for name in dataset.categorical_columns() {
            let values = dataset.categorical_values(&name)?;
            categorical.push(statistics::describe_categorical(&name, &values));
        }

        let (correlation, histograms, notice) =
            self.numeric_views(&numeric_values, NO_NUMERIC_EDA_NOTICE);

        debug!(
            numeric = numeric_values.len(),
            categorical = categorical.len(),
            "EDA summary computed"
        );

        Ok(EdaSummary {
            shape: dataset.shape(),
            numeric,
            categorical,
            correlation,
            histograms,
            notice,
        })
    }

    /// Correlation, scatter pairs and distributions over numeric columns.
    pub fn visualize(&self, dataset: &Dataset) -> Result<VisualizationSummary> {
        dataset.ensure_not_empty()?;

        let numeric_values = Self::numeric_columns(dataset)?;
        let names: Vec<&String> = numeric_values.iter().map(|(name, _)| name).collect();

        let mut scatter_pairs = Vec::new();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                scatter_pairs.push(((*a).clone(), (*b).clone()));
            }
        }

        let (correlation, histograms, notice) =
            self.numeric_views(&numeric_values, NO_NUMERIC_VISUALIZATION_NOTICE);

        Ok(VisualizationSummary {
            correlation,
            scatter_pairs,
            histograms,
            notice,
        })
    }

    fn numeric_columns(dataset: &Dataset) -> Result<Vec<(String, Vec<Option<f64>>)>> {
        dataset
            .numeric_columns()
            .into_iter()
            .map(|name| {
                let values = dataset.numeric_values(&name)?;
                Ok((name, values))
            })
            .collect()
    }

    fn numeric_views(
        &self,
        columns: &[(String, Vec<Option<f64>>)],
        empty_notice: &str,
    ) -> (Option<CorrelationMatrix>, Vec<Histogram>, Option<String>) {
        if columns.is_empty() {
            return (None, Vec::new(), Some(empty_notice.to_string()));
        }

        let correlation = CorrelationMatrix::pearson(columns);
        let histograms = columns
            .iter()
            .map(|(name, values)| statistics::histogram(name, values, self.histogram_bins))
            .collect();
        (Some(correlation), histograms, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mixed() -> Dataset {
        Dataset::from_csv_str("a,b,c,city\n1,2,9,NY\n2,4,8,LA\n3,6,7,LA\n4,8,6,SF\n").unwrap()
    }

    #[test]
    fn test_eda_summary() {
        let summary = DataProfiler::default().eda(&mixed()).unwrap();

        assert_eq!(summary.shape, (4, 4));
        assert_eq!(summary.numeric.len(), 3);
        assert_eq!(summary.categorical.len(), 1);
        assert_eq!(summary.categorical[0].top, Some("LA".to_string()));
        assert_eq!(summary.histograms.len(), 3);
        assert_eq!(summary.histograms[0].counts.len(), DEFAULT_HISTOGRAM_BINS);
        assert!(summary.notice.is_none());

        let correlation = summary.correlation.unwrap();
        assert!((correlation.get("a", "b").unwrap() - 1.0).abs() < 1e-12);
        assert!((correlation.get("a", "c").unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_eda_without_numeric_columns() {
        let dataset = Dataset::from_csv_str("city,color\nNY,red\nLA,blue\n").unwrap();
        let summary = DataProfiler::default().eda(&dataset).unwrap();

        assert!(summary.numeric.is_empty());
        assert!(summary.correlation.is_none());
        assert_eq!(summary.notice.as_deref(), Some(NO_NUMERIC_EDA_NOTICE));
    }

    #[test]
    fn test_visualize_scatter_pairs() {
        let summary = DataProfiler::new(10).visualize(&mixed()).unwrap();

        assert_eq!(
            summary.scatter_pairs,
            vec![
                ("a".to_string(), "b".to_string()),
                ("a".to_string(), "c".to_string()),
                ("b".to_string(), "c".to_string()),
            ]
        );
        assert_eq!(summary.histograms[0].counts.len(), 10);
    }

    #[test]
    fn test_visualize_without_numeric_columns() {
        let dataset = Dataset::from_csv_str("city\nNY\nLA\n").unwrap();
        let summary = DataProfiler::default().visualize(&dataset).unwrap();

        assert!(summary.scatter_pairs.is_empty());
        assert_eq!(summary.notice.as_deref(), Some(NO_NUMERIC_VISUALIZATION_NOTICE));
    }
}
