//! Descriptive Pearson correlations over panel columns.
//!
//! Pairwise-complete: each pair of columns is correlated over the rows
//! where both values are present. A pair with fewer than 2 complete
//! observations, or with zero variance on either side, has an undefined
//! correlation reported as `None` — never NaN.

use cp_panel::{Column, Panel};
use serde::Serialize;

/// Symmetric matrix of pairwise-complete Pearson correlations.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    /// Column names, in request order.
    pub columns: Vec<&'static str>,
    /// `values[i][j]` = correlation of columns i and j, `None` when
    /// undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Correlation between two columns by name.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        self.values[i][j]
    }
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Pairwise-complete Pearson correlation matrix over `columns`.
pub fn correlation_matrix(panel: &Panel, columns: &[Column]) -> CorrelationMatrix {
    let k = columns.len();
    let mut values = vec![vec![None; k]; k];

    for i in 0..k {
        for j in i..k {
            let pairs: Vec<(f64, f64)> = panel
                .rows()
                .iter()
                .filter_map(|r| Some((r.column(columns[i])?, r.column(columns[j])?)))
                .collect();
            let r = pearson(&pairs);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix { columns: columns.iter().map(|c| c.name()).collect(), values }
}
