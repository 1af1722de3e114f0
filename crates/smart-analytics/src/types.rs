//! Core value types shared across the crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a column, fixed when the dataset is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Floating point values.
    Numeric,
    /// Arbitrary string labels.
    Categorical,
}

impl ColumnKind {
    /// Lower-case name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and declared kind of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Missing-cell counts for one column before and after imputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMissing {
    pub column: String,
    pub kind: ColumnKind,
    pub missing_before: usize,
    pub missing_after: usize,
}

/// Per-row outcome of anomaly detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyLabel {
    Normal,
    Anomalous,
}

impl AnomalyLabel {
    /// Value written into the label column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Anomalous => "anomalous",
        }
    }

    /// Outlier-detection convention: `1` for inliers, `-1` for outliers.
    pub fn code(&self) -> i8 {
        match self {
            Self::Normal => 1,
            Self::Anomalous => -1,
        }
    }

    pub fn is_anomalous(&self) -> bool {
        matches!(self, Self::Anomalous)
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row placed in the 2-D projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    /// Position of the row in the original dataset.
    pub row: usize,
    pub x: f64,
    pub y: f64,
    pub label: AnomalyLabel,
}

/// First two numeric columns of a labeled dataset, ready for a scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub x_column: String,
    pub y_column: String,
    pub points: Vec<ScatterPoint>,
}

impl Projection {
    /// Points labeled anomalous.
    pub fn anomalous_points(&self) -> impl Iterator<Item = &ScatterPoint> {
        self.points.iter().filter(|p| p.label.is_anomalous())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_codes() {
        assert_eq!(AnomalyLabel::Normal.code(), 1);
        assert_eq!(AnomalyLabel::Anomalous.code(), -1);
        assert!(AnomalyLabel::Anomalous.is_anomalous());
        assert_eq!(AnomalyLabel::Normal.to_string(), "normal");
    }

    #[test]
    fn test_column_kind_serialization() {
        let json = serde_json::to_string(&ColumnKind::Categorical).unwrap();
        assert_eq!(json, "\"categorical\"");
        let kind: ColumnKind = serde_json::from_str("\"numeric\"").unwrap();
        assert_eq!(kind, ColumnKind::Numeric);
    }

    #[test]
    fn test_projection_anomalous_points() {
        let projection = Projection {
            x_column: "a".to_string(),
            y_column: "b".to_string(),
            points: vec![
                ScatterPoint { row: 0, x: 1.0, y: 1.0, label: AnomalyLabel::Normal },
                ScatterPoint { row: 1, x: 9.0, y: 9.0, label: AnomalyLabel::Anomalous },
            ],
        };
        let rows: Vec<usize> = projection.anomalous_points().map(|p| p.row).collect();
        assert_eq!(rows, vec![1]);
    }
}
