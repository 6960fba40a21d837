//! Difference-in-differences estimator.
//!
//! The canonical four-cell comparison: partition observations by (treated
//! vs. control state, reference-pre vs. reference-post year), average the
//! outcome within each cell, and net the control group's change out of the
//! treated group's change. Netting out the common time trend is what
//! separates this from the naive pre/post comparison.

use std::collections::BTreeSet;

use cp_core::{Error, Result};
use cp_panel::{mean_where, Outcome, Panel};
use serde::Serialize;

/// Result of a 2×2 DiD comparison.
///
/// Sign convention: a positive `estimate` means the treated group's outcome
/// rose (or fell less) relative to control between the two reference years.
/// What that implies depends on the outcome — a positive DiD on homicide
/// points to an adverse association — and carries no causal claim on its
/// own without the fixed-effects regression cross-check.
#[derive(Debug, Clone, Serialize)]
pub struct DidResult {
    /// `(post_treated − pre_treated) − (post_control − pre_control)`.
    pub estimate: f64,
    /// Mean outcome: treated states in the pre year.
    pub mean_treated_pre: f64,
    /// Mean outcome: treated states in the post year.
    pub mean_treated_post: f64,
    /// Mean outcome: control states in the pre year.
    pub mean_control_pre: f64,
    /// Mean outcome: control states in the post year.
    pub mean_control_post: f64,
    /// Number of treated states.
    pub n_treated: usize,
    /// Number of control states.
    pub n_control: usize,
}

/// Four-cell DiD for an explicit treated/control partition.
///
/// The same function serves every outcome column — callers invoke it once
/// per crime type instead of duplicating the four-mean computation. Any
/// empty cell fails with [`Error::EmptyGroup`] naming the cell.
pub fn did(
    panel: &Panel,
    outcome: Outcome,
    treated: &BTreeSet<u32>,
    control: &BTreeSet<u32>,
    year_pre: i32,
    year_post: i32,
) -> Result<DidResult> {
    if treated.is_empty() || control.is_empty() {
        return Err(Error::Validation(
            "treated and control state sets must both be non-empty".to_string(),
        ));
    }
    if !treated.is_disjoint(control) {
        return Err(Error::Validation(
            "treated and control state sets overlap".to_string(),
        ));
    }

    let cell = |states: &BTreeSet<u32>, year: i32, label: &str| {
        mean_where(
            panel.rows().iter().filter(|r| r.year == year && states.contains(&r.sid)),
            |r| r.outcome(outcome),
            label,
        )
    };

    let mean_treated_pre = cell(treated, year_pre, "treated states in the pre year")?;
    let mean_treated_post = cell(treated, year_post, "treated states in the post year")?;
    let mean_control_pre = cell(control, year_pre, "control states in the pre year")?;
    let mean_control_post = cell(control, year_post, "control states in the post year")?;

    let estimate =
        (mean_treated_post - mean_treated_pre) - (mean_control_post - mean_control_pre);

    Ok(DidResult {
        estimate,
        mean_treated_pre,
        mean_treated_post,
        mean_control_pre,
        mean_control_post,
        n_treated: treated.len(),
        n_control: control.len(),
    })
}

/// DiD with the treated set derived from the phase indicator.
///
/// Treated = states whose phase is post in `doctrine_year` (the same
/// selection matched-year CATE uses); control = the complement over the
/// panel's full state universe.
pub fn did_for_doctrine_year(
    panel: &Panel,
    outcome: Outcome,
    doctrine_year: i32,
    year_pre: i32,
    year_post: i32,
) -> Result<DidResult> {
    let treated = panel.states_with_doctrine_in(doctrine_year);
    let control = panel.control_states(&treated);
    did(panel, outcome, &treated, &control, year_pre, year_post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cp_panel::PanelRow;

    fn row(sid: u32, year: i32, post: bool, homicide: f64) -> PanelRow {
        PanelRow::new(sid, year, post).with_outcome(Outcome::Homicide, homicide)
    }

    /// Treated states {1, 2}: pre mean 10, post mean 8.
    /// Control states {3, 4}: pre mean 6, post mean 7.
    /// DiD = (8 − 10) − (7 − 6) = −3.
    fn fixture() -> Panel {
        Panel::new(vec![
            row(1, 2005, false, 9.0),
            row(2, 2005, false, 11.0),
            row(1, 2010, true, 7.0),
            row(2, 2010, true, 9.0),
            row(3, 2005, false, 5.0),
            row(4, 2005, false, 7.0),
            row(3, 2010, false, 6.0),
            row(4, 2010, false, 8.0),
        ])
        .unwrap()
    }

    fn sets() -> (BTreeSet<u32>, BTreeSet<u32>) {
        ([1, 2].into_iter().collect(), [3, 4].into_iter().collect())
    }

    #[test]
    fn test_did_four_cell_fixture() {
        let (treated, control) = sets();
        let res = did(&fixture(), Outcome::Homicide, &treated, &control, 2005, 2010).unwrap();
        assert_relative_eq!(res.mean_treated_pre, 10.0);
        assert_relative_eq!(res.mean_treated_post, 8.0);
        assert_relative_eq!(res.mean_control_pre, 6.0);
        assert_relative_eq!(res.mean_control_post, 7.0);
        assert_relative_eq!(res.estimate, -3.0);
        assert_eq!((res.n_treated, res.n_control), (2, 2));
    }

    #[test]
    fn test_did_antisymmetric_under_label_swap() {
        let (treated, control) = sets();
        let panel = fixture();
        let ab = did(&panel, Outcome::Homicide, &treated, &control, 2005, 2010).unwrap();
        let ba = did(&panel, Outcome::Homicide, &control, &treated, 2005, 2010).unwrap();
        assert_relative_eq!(ab.estimate, -ba.estimate, max_relative = 1e-12);
    }

    #[test]
    fn test_did_invariant_under_common_shock() {
        // Add a constant to every state's outcome in the post year; the
        // common shock must cancel.
        let (treated, control) = sets();
        let base = did(&fixture(), Outcome::Homicide, &treated, &control, 2005, 2010).unwrap();

        let shocked: Vec<PanelRow> = fixture()
            .rows()
            .iter()
            .map(|r| {
                let mut r = r.clone();
                if r.year == 2010 {
                    r.homicide = r.homicide.map(|h| h + 42.0);
                }
                r
            })
            .collect();
        let shocked = Panel::new(shocked).unwrap();
        let res = did(&shocked, Outcome::Homicide, &treated, &control, 2005, 2010).unwrap();
        assert_relative_eq!(res.estimate, base.estimate, max_relative = 1e-12);
    }

    #[test]
    fn test_did_for_doctrine_year_partition() {
        let res = did_for_doctrine_year(&fixture(), Outcome::Homicide, 2010, 2005, 2010).unwrap();
        assert_relative_eq!(res.estimate, -3.0);
    }

    #[test]
    fn test_overlapping_sets_rejected() {
        let treated: BTreeSet<u32> = [1, 2].into_iter().collect();
        let control: BTreeSet<u32> = [2, 3].into_iter().collect();
        let err =
            did(&fixture(), Outcome::Homicide, &treated, &control, 2005, 2010).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_empty_cell_errors() {
        let (treated, control) = sets();
        // No observations in 1999 at all.
        let err =
            did(&fixture(), Outcome::Homicide, &treated, &control, 1999, 2010).unwrap_err();
        assert!(matches!(err, Error::EmptyGroup(_)));
    }
}
