//! Conditional average treatment effects, computed per state.
//!
//! Both modes produce one (pre-mean, post-mean, effect) record per treated
//! state and aggregate them with an unweighted mean over states: a state's
//! effect counts once regardless of how many rows it contributes. That
//! equal weighting is the estimator under study — a state with an extreme
//! baseline and near-zero effect sits beside states with large effects
//! without being downweighted by population, a known Simpson's-paradox
//! style aggregation risk that this implementation deliberately preserves.

use std::collections::BTreeSet;

use cp_core::{Error, Result};
use cp_panel::{group_means, MeanAccum, Outcome, Panel};
use serde::Serialize;

/// Per-state treatment effect record.
#[derive(Debug, Clone, Serialize)]
pub struct StateEffect {
    /// State identifier.
    pub sid: u32,
    /// Mean outcome over the state's pre-treatment rows.
    pub pre_mean: f64,
    /// Mean outcome over the state's post-treatment rows.
    pub post_mean: f64,
    /// `post_mean - pre_mean`.
    pub effect: f64,
}

/// Result of a CATE computation.
#[derive(Debug, Clone, Serialize)]
pub struct CateResult {
    /// One record per state with both sides defined, sorted by state id
    /// ascending. The ordering is for reproducible display only.
    pub by_state: Vec<StateEffect>,
    /// Unweighted mean of the per-state effects.
    pub cate: f64,
    /// Number of states contributing to `cate`.
    pub n_states: usize,
    /// Treated states excluded because their pre- or post-side mean was
    /// undefined (no usable rows). Surfaced so the exclusion is visible
    /// rather than silent.
    pub skipped: Vec<u32>,
}

/// Reference years for [`cate_matched_years`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatchedYears {
    /// Year whose phase indicator defines the treated-state set.
    pub treat_year: i32,
    /// Calendar year supplying every pre-treatment mean.
    pub pre_year: i32,
    /// Calendar year supplying every post-treatment mean.
    pub post_year: i32,
}

fn aggregate(
    treated: &BTreeSet<u32>,
    side: impl Fn(u32) -> (Option<f64>, Option<f64>),
) -> Result<CateResult> {
    let mut by_state = Vec::new();
    let mut skipped = Vec::new();
    let mut overall = MeanAccum::new();

    for &sid in treated {
        match side(sid) {
            (Some(pre_mean), Some(post_mean)) => {
                let effect = post_mean - pre_mean;
                overall.push(effect);
                by_state.push(StateEffect { sid, pre_mean, post_mean, effect });
            }
            _ => skipped.push(sid),
        }
    }

    let cate = overall.mean().ok_or_else(|| {
        Error::EmptyGroup("no treated state has both a pre- and post-treatment mean".to_string())
    })?;

    Ok(CateResult { by_state, cate, n_states: overall.count(), skipped })
}

/// All-history CATE.
///
/// Restricts to states with at least one post-treatment row anywhere in the
/// panel; each state's pre- and post-means run over all of its pre/post
/// rows respectively.
pub fn cate_all_history(panel: &Panel, outcome: Outcome) -> Result<CateResult> {
    let treated = panel.states_with_doctrine();
    if treated.is_empty() {
        return Err(Error::EmptyGroup(
            "no state has a post-treatment observation".to_string(),
        ));
    }

    let means = group_means(
        panel.rows().iter().filter(|r| treated.contains(&r.sid)),
        |r| (r.sid, r.post),
        |r| r.outcome(outcome),
    );

    aggregate(&treated, |sid| {
        let pre = means.get(&(sid, false)).and_then(MeanAccum::mean);
        let post = means.get(&(sid, true)).and_then(MeanAccum::mean);
        (pre, post)
    })
}

/// Matched-year CATE.
///
/// The treated-state set is pinned to states whose phase is post in
/// `years.treat_year`; pre- and post-means then use only rows from
/// `years.pre_year` and `years.post_year`. Holding the calendar fixed like
/// this keeps a year-to-year comparison from conflating the passage of
/// time with treatment, at the cost of a typically smaller state set.
pub fn cate_matched_years(
    panel: &Panel,
    outcome: Outcome,
    years: MatchedYears,
) -> Result<CateResult> {
    let treated = panel.states_with_doctrine_in(years.treat_year);
    if treated.is_empty() {
        return Err(Error::EmptyGroup(format!(
            "no state has a post-treatment observation in {}",
            years.treat_year
        )));
    }

    let pre = group_means(
        panel.rows().iter().filter(|r| r.year == years.pre_year && treated.contains(&r.sid)),
        |r| r.sid,
        |r| r.outcome(outcome),
    );
    let post = group_means(
        panel.rows().iter().filter(|r| r.year == years.post_year && treated.contains(&r.sid)),
        |r| r.sid,
        |r| r.outcome(outcome),
    );

    aggregate(&treated, |sid| {
        (pre.get(&sid).and_then(MeanAccum::mean), post.get(&sid).and_then(MeanAccum::mean))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cp_panel::PanelRow;

    fn row(sid: u32, year: i32, post: bool, homicide: f64) -> PanelRow {
        PanelRow::new(sid, year, post).with_outcome(Outcome::Homicide, homicide)
    }

    /// State 1: pre mean 5.0, post mean 4.0. State 2: pre mean 8.0, post
    /// mean 8.5. State 3 never treats and must not appear.
    fn fixture() -> Panel {
        Panel::new(vec![
            row(1, 2004, false, 4.5),
            row(1, 2005, false, 5.5),
            row(1, 2006, true, 3.5),
            row(1, 2007, true, 4.5),
            row(2, 2004, false, 7.5),
            row(2, 2005, false, 8.5),
            row(2, 2006, true, 8.0),
            row(2, 2007, true, 9.0),
            row(3, 2004, false, 20.0),
            row(3, 2005, false, 21.0),
            row(3, 2006, false, 22.0),
            row(3, 2007, false, 23.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_all_history_known_effects() {
        let res = cate_all_history(&fixture(), Outcome::Homicide).unwrap();
        assert_eq!(res.n_states, 2);
        assert!(res.skipped.is_empty());
        assert_eq!(res.by_state.len(), 2);

        assert_eq!(res.by_state[0].sid, 1);
        assert_relative_eq!(res.by_state[0].pre_mean, 5.0);
        assert_relative_eq!(res.by_state[0].post_mean, 4.0);
        assert_relative_eq!(res.by_state[0].effect, -1.0);

        assert_eq!(res.by_state[1].sid, 2);
        assert_relative_eq!(res.by_state[1].effect, 0.5);

        // (-1.0 + 0.5) / 2 — one vote per state, not per row.
        assert_relative_eq!(res.cate, -0.25);
    }

    #[test]
    fn test_matched_years_pins_the_calendar() {
        let panel = fixture();
        let res = cate_matched_years(
            &panel,
            Outcome::Homicide,
            MatchedYears { treat_year: 2007, pre_year: 2005, post_year: 2007 },
        )
        .unwrap();
        assert_eq!(res.n_states, 2);
        // State 1: 4.5 - 5.5 = -1.0; state 2: 9.0 - 8.5 = 0.5.
        assert_relative_eq!(res.by_state[0].effect, -1.0);
        assert_relative_eq!(res.by_state[1].effect, 0.5);
        assert_relative_eq!(res.cate, -0.25);
    }

    #[test]
    fn test_modes_agree_on_two_year_panel() {
        // With exactly two years, all-history and matched-year collapse to
        // the same computation.
        let panel = Panel::new(vec![
            row(1, 2005, false, 6.0),
            row(1, 2010, true, 4.0),
            row(2, 2005, false, 9.0),
            row(2, 2010, true, 9.5),
            row(3, 2005, false, 3.0),
            row(3, 2010, false, 3.5),
        ])
        .unwrap();
        let all = cate_all_history(&panel, Outcome::Homicide).unwrap();
        let matched = cate_matched_years(
            &panel,
            Outcome::Homicide,
            MatchedYears { treat_year: 2010, pre_year: 2005, post_year: 2010 },
        )
        .unwrap();
        assert_eq!(all.n_states, matched.n_states);
        assert_relative_eq!(all.cate, matched.cate);
        for (a, m) in all.by_state.iter().zip(&matched.by_state) {
            assert_eq!(a.sid, m.sid);
            assert_relative_eq!(a.effect, m.effect);
        }
    }

    #[test]
    fn test_state_without_pre_rows_is_skipped() {
        // State 2 enters the panel already treated: no pre-treatment rows.
        let panel = Panel::new(vec![
            row(1, 2005, false, 5.0),
            row(1, 2010, true, 4.0),
            row(2, 2010, true, 7.0),
        ])
        .unwrap();
        let res = cate_all_history(&panel, Outcome::Homicide).unwrap();
        assert_eq!(res.n_states, 1);
        assert_eq!(res.skipped, vec![2]);
        assert_relative_eq!(res.cate, -1.0);
    }

    #[test]
    fn test_every_state_skipped_errors() {
        // The only treated state has no pre-treatment rows at all.
        let panel =
            Panel::new(vec![row(1, 2010, true, 7.0), row(2, 2005, false, 3.0)]).unwrap();
        let err = cate_all_history(&panel, Outcome::Homicide).unwrap_err();
        assert!(matches!(err, Error::EmptyGroup(_)));
    }

    #[test]
    fn test_no_treated_states_errors() {
        let panel = Panel::new(vec![row(1, 2005, false, 5.0)]).unwrap();
        assert!(matches!(
            cate_all_history(&panel, Outcome::Homicide),
            Err(Error::EmptyGroup(_))
        ));
        assert!(matches!(
            cate_matched_years(
                &panel,
                Outcome::Homicide,
                MatchedYears { treat_year: 2010, pre_year: 2005, post_year: 2010 }
            ),
            Err(Error::EmptyGroup(_))
        ));
    }
}
