//! Naive pre/post treatment-effect estimator.
//!
//! The simplest cut at the question: pool every observation, compare the
//! post-treatment mean to the pre-treatment mean, and test the difference
//! with a two-sample t-test. This ignores the panel's repeated-measures
//! structure entirely (the same state appears in both phases), so it is a
//! baseline for comparison against the per-state, DiD, and fixed-effects
//! estimators — not a recommended method on its own.

use cp_core::{Error, Result};
use cp_panel::{mean_where, Outcome, Panel, PanelRow};

use crate::ttest::{welch_t_test, TwoSampleTest};

/// Mean outcome over post-treatment rows minus mean over pre-treatment
/// rows, with no covariate adjustment and no state-level structure.
pub fn average_treatment_effect(panel: &Panel, outcome: Outcome) -> Result<f64> {
    let post = mean_where(
        panel.rows().iter().filter(|r| r.post),
        |r| r.outcome(outcome),
        "post-treatment rows",
    )?;
    let pre = mean_where(
        panel.rows().iter().filter(|r| !r.post),
        |r| r.outcome(outcome),
        "pre-treatment rows",
    )?;
    Ok(post - pre)
}

/// The most recent `sample_size` observations of one phase, by calendar
/// year descending. The sort is stable, so rows from the same year keep
/// their original order. Rows with a missing outcome are dropped after the
/// head-N restriction.
fn recent_values(
    panel: &Panel,
    outcome: Outcome,
    phase: bool,
    sample_size: usize,
) -> Result<Vec<f64>> {
    let mut rows: Vec<&PanelRow> = panel.rows().iter().filter(|r| r.post == phase).collect();
    if rows.len() < sample_size {
        return Err(Error::InsufficientSample(format!(
            "requested {} {} observations, panel has {}",
            sample_size,
            if phase { "post-treatment" } else { "pre-treatment" },
            rows.len()
        )));
    }
    rows.sort_by_key(|r| std::cmp::Reverse(r.year));
    Ok(rows.into_iter().take(sample_size).filter_map(|r| r.outcome(outcome)).collect())
}

/// Welch two-sample test of the naive pre/post difference, restricted to
/// each phase's most recent `sample_size` observations.
///
/// The statistic is oriented pre-minus-post: a negative mean difference in
/// the outcome (post above pre) yields a negative `t_stat`.
pub fn significance_test(
    panel: &Panel,
    outcome: Outcome,
    sample_size: usize,
) -> Result<TwoSampleTest> {
    let pre = recent_values(panel, outcome, false, sample_size)?;
    let post = recent_values(panel, outcome, true, sample_size)?;
    welch_t_test(&pre, &post)
}
