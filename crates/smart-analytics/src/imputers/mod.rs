//! Missing-value imputation.
//!
//! - Statistical imputation (mean for numeric, mode for categorical)

mod statistical;

pub use statistical::{ImputationResult, StatisticalImputer};
