//! Per-column descriptive statistics and histograms.

use crate::utils::{mean, mode_with_count, quantile_sorted, sample_std, sorted_copy};
use serde::Serialize;
use std::collections::HashSet;

/// `describe()`-style summary of a numeric column.
///
/// Every statistic is `None` when the column has no observed values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Summary of a categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub count: usize,
    pub unique: usize,
    /// Most frequent value, ties resolved to the smallest.
    pub top: Option<String>,
    pub freq: usize,
}

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub column: String,
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

pub(crate) fn describe_numeric(column: &str, values: &[Option<f64>]) -> NumericSummary {
    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    let sorted = sorted_copy(&observed);

    NumericSummary {
        column: column.to_string(),
        count: observed.len(),
        mean: mean(&observed),
        std: (!observed.is_empty()).then(|| {
            if observed.len() < 2 {
                f64::NAN
            } else {
                sample_std(&observed)
            }
        }),
        min: sorted.first().copied(),
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

pub(crate) fn describe_categorical(column: &str, values: &[Option<String>]) -> CategoricalSummary {
    let observed: Vec<&str> = values.iter().flatten().map(String::as_str).collect();
    let unique = observed.iter().collect::<HashSet<_>>().len();
    let (top, freq) = match mode_with_count(observed.iter().copied()) {
        Some((value, count)) => (Some(value), count),
        None => (None, 0),
    };

    CategoricalSummary {
        column: column.to_string(),
        count: observed.len(),
        unique,
        top,
        freq,
    }
}

/// Bin observed values into `bins` equal-width buckets over `[min, max]`.
///
/// The last bucket is closed on the right. A constant column is spread over
/// `[v - 0.5, v + 0.5]`.
pub(crate) fn histogram(column: &str, values: &[Option<f64>], bins: usize) -> Histogram {
    let observed: Vec<f64> = values.iter().flatten().copied().collect();
    let bins = bins.max(1);

    let (lo, hi) = match (
        observed.iter().copied().reduce(f64::min),
        observed.iter().copied().reduce(f64::max),
    ) {
        (Some(lo), Some(hi)) if hi > lo => (lo, hi),
        (Some(v), Some(_)) => (v - 0.5, v + 0.5),
        _ => (0.0, 1.0),
    };

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for v in observed {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Histogram {
        column: column.to_string(),
        edges,
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe_numeric() {
        let summary = describe_numeric("a", &[Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);

        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, Some(2.5));
        assert_eq!(summary.min, Some(1.0));
        assert_eq!(summary.q25, Some(1.75));
        assert_eq!(summary.median, Some(2.5));
        assert_eq!(summary.q75, Some(3.25));
        assert_eq!(summary.max, Some(4.0));
        let std = summary.std.unwrap();
        assert!((std - 1.290_994_448_7).abs() < 1e-9);
    }

    #[test]
    fn test_describe_numeric_empty() {
        let summary = describe_numeric("a", &[None, None]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.std, None);
        assert_eq!(summary.max, None);
    }

    #[test]
    fn test_describe_categorical() {
        let values = vec![
            Some("LA".to_string()),
            Some("NY".to_string()),
            None,
            Some("LA".to_string()),
        ];
        let summary = describe_categorical("city", &values);
        assert_eq!(
            summary,
            CategoricalSummary {
                column: "city".to_string(),
                count: 3,
                unique: 2,
                top: Some("LA".to_string()),
                freq: 2,
            }
        );
    }

    #[test]
    fn test_histogram_counts_every_value() {
        let values: Vec<Option<f64>> = (0..=10).map(|i| Some(i as f64)).collect();
        let hist = histogram("a", &values, 5);

        assert_eq!(hist.edges.len(), 6);
        assert_eq!(hist.edges[0], 0.0);
        assert_eq!(hist.edges[5], 10.0);
        assert_eq!(hist.counts, vec![2, 2, 2, 2, 3]);
        assert_eq!(hist.total(), 11);
    }

    #[test]
    fn test_histogram_constant_column() {
        let hist = histogram("a", &[Some(3.0), Some(3.0)], 30);
        assert_eq!(hist.counts.len(), 30);
        assert_eq!(hist.total(), 2);
        assert_eq!(hist.edges[0], 2.5);
    }

    #[test]
    fn test_summary_serializes_quantile_names() {
        let summary = describe_numeric("a", &[Some(1.0)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["50%"], serde_json::json!(1.0));
        assert!(json["std"].is_null());
    }
}
