//! Core traits for CausalPanel
//!
//! This module defines the trait seam that keeps estimation logic
//! independent of the concrete linear-algebra backend: the fixed-effects
//! estimator is written against [`LeastSquaresSolver`], not against a
//! specific matrix library.

use crate::Result;

/// Output of a least-squares solve.
#[derive(Debug, Clone)]
pub struct LeastSquaresFit {
    /// Coefficient estimates (length p).
    pub beta: Vec<f64>,

    /// Residuals `y - X·beta` (length n).
    pub residuals: Vec<f64>,

    /// `(X'X)^{-1}`, row-major, shape (p, p). Needed by sandwich
    /// covariance estimators downstream.
    pub xtx_inv: Vec<f64>,
}

/// Least-squares backend trait.
///
/// Implementations solve `min ||y - X·b||²` for a dense row-major design
/// matrix and must fail with a rank-deficiency error when `X'X` is
/// singular rather than returning garbage coefficients.
pub trait LeastSquaresSolver: Send + Sync {
    /// Solve the least-squares problem. `x` is row-major with shape (n, p).
    fn solve(&self, x: &[f64], y: &[f64], n: usize, p: usize) -> Result<LeastSquaresFit>;

    /// Backend name (e.g. "nalgebra-dense").
    fn name(&self) -> &str;
}
