//! Fixed-effects OLS regression with cluster-robust standard errors.
//!
//! The design matrix carries the treatment indicator, the caller's
//! covariates, one dummy per state except a reference, and one dummy per
//! year except a reference. State dummies absorb every time-invariant
//! state-level confounder; year dummies absorb shocks common to all states
//! in a year. The treatment coefficient is therefore the within-state,
//! within-year-adjusted association — the identification strategy the
//! four-cell DiD is cross-checked against.
//!
//! Standard errors come from the Liang–Zeger sandwich clustered by state
//! (see [`crate::ols`]); plain OLS errors would understate variance here
//! because residuals of the same state are serially correlated across
//! years. Inference (p-values, confidence intervals) uses a Student-t
//! reference with `G − 1` degrees of freedom, `G` the cluster count.

use std::collections::BTreeSet;

use cp_core::{CoefficientRow, Error, LeastSquaresSolver, Result};
use cp_panel::{Covariate, MeanAccum, Outcome, Panel};
use serde::Serialize;

use crate::ols::{cluster_robust_covariance, DenseOlsSolver};
use crate::ttest::{t_cdf, t_quantile};

/// A fitted fixed-effects model.
#[derive(Debug, Clone, Serialize)]
pub struct FeFit {
    /// One row per regressor: intercept, treatment, covariates, then state
    /// and year dummies.
    pub coefficients: Vec<CoefficientRow>,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// Residual degrees of freedom (`n - p`).
    pub residual_dof: usize,
    /// Observations used in the fit.
    pub n_obs: usize,
    /// Rows dropped for a missing outcome or covariate (listwise deletion).
    pub n_dropped: usize,
    /// Distinct clusters (states); inference uses `n_clusters - 1` t-dof.
    pub n_clusters: usize,
}

impl FeFit {
    /// Look up a coefficient row by regressor name.
    pub fn coefficient(&self, name: &str) -> Option<&CoefficientRow> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

/// Fit with the default dense-OLS backend.
pub fn fit_fe_model(panel: &Panel, outcome: Outcome, covariates: &[Covariate]) -> Result<FeFit> {
    fit_fe_model_with(&DenseOlsSolver, panel, outcome, covariates)
}

/// Fit against an explicit least-squares backend.
///
/// The treatment regressor is the panel's phase indicator and the cluster
/// key is the state identifier — both fixed by the row schema rather than
/// passed as column names.
pub fn fit_fe_model_with(
    solver: &dyn LeastSquaresSolver,
    panel: &Panel,
    outcome: Outcome,
    covariates: &[Covariate],
) -> Result<FeFit> {
    let mut seen = BTreeSet::new();
    for &c in covariates {
        if !seen.insert(c) {
            return Err(Error::Validation(format!("covariate '{c}' listed twice")));
        }
    }

    // Listwise deletion: a row enters the fit only with a complete outcome
    // and covariate set.
    let mut usable = Vec::new();
    for row in panel.rows() {
        let Some(y_val) = row.outcome(outcome) else { continue };
        let cov_vals: Option<Vec<f64>> =
            covariates.iter().map(|&c| row.covariate(c)).collect();
        let Some(cov_vals) = cov_vals else { continue };
        usable.push((row, y_val, cov_vals));
    }
    let n = usable.len();
    let n_dropped = panel.len() - n;
    if n == 0 {
        return Err(Error::EmptyGroup(
            "no row has a complete outcome and covariate set".to_string(),
        ));
    }

    let states: Vec<u32> =
        usable.iter().map(|(r, _, _)| r.sid).collect::<BTreeSet<_>>().into_iter().collect();
    let years: Vec<i32> =
        usable.iter().map(|(r, _, _)| r.year).collect::<BTreeSet<_>>().into_iter().collect();

    // Reference levels: the smallest state id and the earliest year.
    let state_dummies = &states[1..];
    let year_dummies = &years[1..];

    let p = 2 + covariates.len() + state_dummies.len() + year_dummies.len();

    let mut names = Vec::with_capacity(p);
    names.push("const".to_string());
    names.push("post".to_string());
    names.extend(covariates.iter().map(|c| c.name().to_string()));
    names.extend(state_dummies.iter().map(|s| format!("sid[{s}]")));
    names.extend(year_dummies.iter().map(|y| format!("year[{y}]")));

    let mut x = Vec::with_capacity(n * p);
    let mut y = Vec::with_capacity(n);
    let mut clusters = Vec::with_capacity(n);
    for (row, y_val, cov_vals) in &usable {
        x.push(1.0);
        x.push(if row.post { 1.0 } else { 0.0 });
        x.extend_from_slice(cov_vals);
        for &s in state_dummies {
            x.push(if row.sid == s { 1.0 } else { 0.0 });
        }
        for &yr in year_dummies {
            x.push(if row.year == yr { 1.0 } else { 0.0 });
        }
        y.push(*y_val);
        clusters.push(row.sid);
    }

    let fit = solver.solve(&x, &y, n, p)?;
    let vcov = cluster_robust_covariance(&x, &fit.residuals, &fit.xtx_inv, &clusters, n, p)?;

    let mut y_acc = MeanAccum::new();
    for &v in &y {
        y_acc.push(v);
    }
    let y_mean = y_acc.mean().unwrap_or(0.0);
    let tss: f64 = y.iter().map(|v| (v - y_mean) * (v - y_mean)).sum();
    let rss: f64 = fit.residuals.iter().map(|e| e * e).sum();
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };

    let n_clusters = states.len();
    let t_dof = (n_clusters - 1) as f64;
    let t_crit = t_quantile(0.975, t_dof);

    let coefficients = names
        .into_iter()
        .enumerate()
        .map(|(j, name)| {
            let estimate = fit.beta[j];
            let std_error = vcov[j * p + j].max(0.0).sqrt();
            let (t_stat, p_value) = if std_error > 0.0 {
                let t = estimate / std_error;
                (t, 2.0 * (1.0 - t_cdf(t.abs(), t_dof)))
            } else {
                (f64::NAN, f64::NAN)
            };
            CoefficientRow {
                name,
                estimate,
                std_error,
                t_stat,
                p_value,
                ci_lower: estimate - t_crit * std_error,
                ci_upper: estimate + t_crit * std_error,
            }
        })
        .collect();

    Ok(FeFit {
        coefficients,
        r_squared,
        residual_dof: n - p,
        n_obs: n,
        n_dropped,
        n_clusters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cp_panel::PanelRow;

    /// Balanced panel: 4 states × 4 years; states 3 and 4 treat from 2002.
    /// y = state_fe + year_fe + delta·post (+ optional covariate term).
    fn planted_panel(delta: f64, with_covariate: bool) -> Panel {
        let mut rows = Vec::new();
        for sid in 1..=4u32 {
            for year in 2000..=2003i32 {
                let post = sid >= 3 && year >= 2002;
                let state_fe = 10.0 * sid as f64;
                let year_fe = 2.0 * (year - 2000) as f64;
                let cov = ((sid as i32 * year) % 7) as f64;
                let mut y = state_fe + year_fe + if post { delta } else { 0.0 };
                let mut row = PanelRow::new(sid, year, post);
                if with_covariate {
                    y += 0.5 * cov;
                    row = row.with_covariate(Covariate::Unemployment, cov);
                }
                rows.push(row.with_outcome(Outcome::Homicide, y));
            }
        }
        Panel::new(rows).unwrap()
    }

    #[test]
    fn test_recovers_planted_effect_without_noise() {
        let fit = fit_fe_model(&planted_panel(2.5, false), Outcome::Homicide, &[]).unwrap();
        let post = fit.coefficient("post").unwrap();
        assert_relative_eq!(post.estimate, 2.5, max_relative = 1e-8);
        for c in &fit.coefficients {
            assert!(c.std_error >= 0.0 && c.std_error.is_finite(), "{}: {}", c.name, c.std_error);
        }
        assert!(fit.r_squared > 0.999999);
        assert_eq!(fit.n_obs, 16);
        assert_eq!(fit.n_clusters, 4);
        // 16 obs, p = 2 + 3 state + 3 year dummies = 8.
        assert_eq!(fit.residual_dof, 8);
    }

    #[test]
    fn test_recovers_covariate_coefficient() {
        let fit = fit_fe_model(
            &planted_panel(2.5, true),
            Outcome::Homicide,
            &[Covariate::Unemployment],
        )
        .unwrap();
        assert_relative_eq!(fit.coefficient("post").unwrap().estimate, 2.5, max_relative = 1e-8);
        assert_relative_eq!(
            fit.coefficient("unemployrt").unwrap().estimate,
            0.5,
            max_relative = 1e-8
        );
    }

    #[test]
    fn test_dummy_names_skip_reference_levels() {
        let fit = fit_fe_model(&planted_panel(1.0, false), Outcome::Homicide, &[]).unwrap();
        let names: Vec<&str> = fit.coefficients.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"sid[2]") && !names.contains(&"sid[1]"));
        assert!(names.contains(&"year[2001]") && !names.contains(&"year[2000]"));
    }

    #[test]
    fn test_duplicate_covariate_rejected() {
        let err = fit_fe_model(
            &planted_panel(1.0, true),
            Outcome::Homicide,
            &[Covariate::Unemployment, Covariate::Unemployment],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_collinear_covariate_rejected() {
        // Covariate equal to the treatment indicator: X'X singular.
        let mut rows = Vec::new();
        for sid in 1..=3u32 {
            for year in 2000..=2002i32 {
                let post = sid == 3 && year >= 2001;
                rows.push(
                    PanelRow::new(sid, year, post)
                        .with_outcome(Outcome::Homicide, sid as f64 + year as f64)
                        .with_covariate(Covariate::Poverty, if post { 1.0 } else { 0.0 }),
                );
            }
        }
        let panel = Panel::new(rows).unwrap();
        let err = fit_fe_model(&panel, Outcome::Homicide, &[Covariate::Poverty]).unwrap_err();
        assert!(matches!(err, Error::RankDeficiency(_)));
    }

    #[test]
    fn test_single_cluster_rejected() {
        let rows: Vec<PanelRow> = (2000..=2009)
            .map(|year| {
                PanelRow::new(1, year, year >= 2005)
                    .with_outcome(Outcome::Homicide, year as f64)
            })
            .collect();
        let panel = Panel::new(rows).unwrap();
        let err = fit_fe_model(&panel, Outcome::Homicide, &[]).unwrap_err();
        assert!(matches!(err, Error::RankDeficiency(_)));
    }

    #[test]
    fn test_listwise_deletion_counts_dropped_rows() {
        let mut rows = planted_panel(2.5, true).rows().to_vec();
        // Strip the covariate from one row; it must drop out of the fit.
        rows[0].unemployrt = None;
        let panel = Panel::new(rows).unwrap();
        let fit =
            fit_fe_model(&panel, Outcome::Homicide, &[Covariate::Unemployment]).unwrap();
        assert_eq!(fit.n_dropped, 1);
        assert_eq!(fit.n_obs, 15);
        assert_relative_eq!(fit.coefficient("post").unwrap().estimate, 2.5, max_relative = 1e-8);
    }

    #[test]
    fn test_no_usable_rows_errors() {
        let panel = Panel::new(vec![PanelRow::new(1, 2000, false)]).unwrap();
        let err = fit_fe_model(&panel, Outcome::Homicide, &[]).unwrap_err();
        assert!(matches!(err, Error::EmptyGroup(_)));
    }
}
