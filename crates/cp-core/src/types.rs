//! Common data types for CausalPanel

use serde::{Deserialize, Serialize};

/// One row of a regression coefficient table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoefficientRow {
    /// Regressor name (e.g. "post", "poverty", "sid[5]").
    pub name: String,

    /// Point estimate.
    pub estimate: f64,

    /// Cluster-robust standard error.
    pub std_error: f64,

    /// t-statistic (estimate / std_error). NaN if the SE is zero.
    pub t_stat: f64,

    /// Two-sided p-value against a Student-t reference distribution.
    pub p_value: f64,

    /// 95% confidence interval lower bound.
    pub ci_lower: f64,

    /// 95% confidence interval upper bound.
    pub ci_upper: f64,
}

impl CoefficientRow {
    /// Whether the estimate is significant at level `alpha` (two-sided).
    pub fn significant(&self, alpha: f64) -> bool {
        self.p_value.is_finite() && self.p_value < alpha
    }
}
