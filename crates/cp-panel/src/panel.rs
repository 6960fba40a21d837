//! The immutable state-year panel and its state-selection helpers.

use std::collections::{BTreeSet, HashSet};

use cp_core::{Error, Result};

use crate::row::PanelRow;

/// An immutable panel of state-year observations.
///
/// (sid, year) is unique within the panel — [`Panel::new`] enforces this so
/// no estimator has to deduplicate. Estimators borrow the panel read-only;
/// derived aggregates are recomputed on demand, never cached or mutated in
/// place.
#[derive(Debug, Clone)]
pub struct Panel {
    rows: Vec<PanelRow>,
}

impl Panel {
    /// Build a panel, rejecting duplicate (sid, year) pairs.
    pub fn new(rows: Vec<PanelRow>) -> Result<Self> {
        let mut seen: HashSet<(u32, i32)> = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert((row.sid, row.year)) {
                return Err(Error::Validation(format!(
                    "duplicate observation for sid {} in year {}",
                    row.sid, row.year
                )));
            }
        }
        Ok(Self { rows })
    }

    /// All observations, in load order.
    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the panel has no observations.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The full state universe, ascending.
    pub fn states(&self) -> BTreeSet<u32> {
        self.rows.iter().map(|r| r.sid).collect()
    }

    /// All calendar years present, ascending.
    pub fn years(&self) -> BTreeSet<i32> {
        self.rows.iter().map(|r| r.year).collect()
    }

    /// States with at least one post-treatment observation anywhere in the
    /// panel.
    pub fn states_with_doctrine(&self) -> BTreeSet<u32> {
        self.rows.iter().filter(|r| r.post).map(|r| r.sid).collect()
    }

    /// States whose phase indicator is set specifically in `year`.
    ///
    /// This is the treatment-defining selection shared by matched-year CATE
    /// and DiD: holding the calendar fixed guards against conflating the
    /// passage of time with treatment.
    pub fn states_with_doctrine_in(&self, year: i32) -> BTreeSet<u32> {
        self.rows.iter().filter(|r| r.post && r.year == year).map(|r| r.sid).collect()
    }

    /// Complement of `treated` over the full state universe.
    pub fn control_states(&self, treated: &BTreeSet<u32>) -> BTreeSet<u32> {
        self.states().difference(treated).copied().collect()
    }
}
