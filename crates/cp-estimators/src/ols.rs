//! Dense least-squares backend and cluster-robust sandwich covariance.
//!
//! The solver implements [`LeastSquaresSolver`] via the normal equations
//! (`beta = (X'X)^{-1} X'y`), failing with a rank-deficiency error when
//! `X'X` cannot be inverted. The sandwich estimator implements the
//! Liang–Zeger cluster-robust covariance
//! `V = c · (X'X)^{-1} [Σ_g s_g s_g'] (X'X)^{-1}` with cluster scores
//! `s_g = X_g' e_g` and the small-sample correction
//! `c = G/(G−1) · (N−1)/(N−K)`.
//!
//! # References
//!
//! - Liang & Zeger (1986), "Longitudinal data analysis using generalized
//!   linear models." *Biometrika*.
//! - Cameron & Miller (2015), "A practitioner's guide to cluster-robust
//!   inference." *Journal of Human Resources*.

use std::collections::BTreeMap;

use cp_core::{Error, LeastSquaresFit, LeastSquaresSolver, Result};
use nalgebra::{DMatrix, DVector};

/// Normal-equations OLS backed by nalgebra's dense inverse.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseOlsSolver;

impl LeastSquaresSolver for DenseOlsSolver {
    fn solve(&self, x: &[f64], y: &[f64], n: usize, p: usize) -> Result<LeastSquaresFit> {
        if n == 0 || p == 0 {
            return Err(Error::Validation("design matrix must be non-empty".to_string()));
        }
        if x.len() != n * p {
            return Err(Error::Validation(format!(
                "x length ({}) != n*p ({})",
                x.len(),
                n * p
            )));
        }
        if y.len() != n {
            return Err(Error::Validation(format!("y length ({}) != n ({})", y.len(), n)));
        }
        if n < p {
            return Err(Error::RankDeficiency(format!(
                "{n} observations cannot identify {p} regressors"
            )));
        }

        let x_mat = DMatrix::from_row_slice(n, p, x);
        let y_vec = DVector::from_column_slice(y);

        let xtx = x_mat.transpose() * &x_mat;
        let xty = x_mat.transpose() * &y_vec;
        let xtx_inv = xtx
            .try_inverse()
            .ok_or_else(|| Error::RankDeficiency("X'X is singular".to_string()))?;

        let beta = &xtx_inv * &xty;
        let y_hat = &x_mat * &beta;
        let resid = &y_vec - &y_hat;

        let mut inv_flat = Vec::with_capacity(p * p);
        for i in 0..p {
            for j in 0..p {
                inv_flat.push(xtx_inv[(i, j)]);
            }
        }

        Ok(LeastSquaresFit {
            beta: beta.iter().copied().collect(),
            residuals: resid.iter().copied().collect(),
            xtx_inv: inv_flat,
        })
    }

    fn name(&self) -> &str {
        "nalgebra-dense"
    }
}

/// Cluster-robust sandwich covariance matrix (row-major, p×p).
///
/// `x` is the row-major design matrix the residuals came from, `xtx_inv`
/// the row-major `(X'X)^{-1}` from the solve. Clusters are keyed by value
/// (ordered map), so the accumulation order is deterministic.
pub fn cluster_robust_covariance(
    x: &[f64],
    residuals: &[f64],
    xtx_inv: &[f64],
    clusters: &[u32],
    n: usize,
    p: usize,
) -> Result<Vec<f64>> {
    if x.len() != n * p || residuals.len() != n || clusters.len() != n {
        return Err(Error::Validation(
            "design, residual, and cluster arrays must agree on n and p".to_string(),
        ));
    }
    if xtx_inv.len() != p * p {
        return Err(Error::Validation(format!(
            "xtx_inv length ({}) != p*p ({})",
            xtx_inv.len(),
            p * p
        )));
    }

    let mut cluster_map: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, &cid) in clusters.iter().enumerate() {
        cluster_map.entry(cid).or_default().push(i);
    }
    let g = cluster_map.len();
    if g < 2 {
        return Err(Error::RankDeficiency(format!(
            "cluster-robust covariance needs at least 2 clusters, got {g}"
        )));
    }

    // Meat of the sandwich: B = Σ_g s_g s_g' with s_g = X_g' e_g.
    let mut meat = DMatrix::zeros(p, p);
    for indices in cluster_map.values() {
        let mut s_g = vec![0.0_f64; p];
        for &i in indices {
            let e_i = residuals[i];
            for j in 0..p {
                s_g[j] += x[i * p + j] * e_i;
            }
        }
        for a in 0..p {
            for b in 0..p {
                meat[(a, b)] += s_g[a] * s_g[b];
            }
        }
    }

    let g_f = g as f64;
    let n_f = n as f64;
    let p_f = p as f64;
    let correction =
        if n_f > p_f { (g_f / (g_f - 1.0)) * ((n_f - 1.0) / (n_f - p_f)) } else { 1.0 };

    let inv = DMatrix::from_row_slice(p, p, xtx_inv);
    let vcov = (&inv * meat) * &inv * correction;

    let mut out = Vec::with_capacity(p * p);
    for i in 0..p {
        for j in 0..p {
            out.push(vcov[(i, j)]);
        }
    }
    Ok(out)
}
