//! # cp-panel
//!
//! The tabular data model for CausalPanel: a typed, immutable panel of
//! state-year crime observations, the CSV loader that produces it, and the
//! grouping/aggregation engine every estimator builds on.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Grouping/aggregation engine (group-wise means, compensated summation).
pub mod group;
/// CSV loader for the published panel layout.
pub mod loader;
/// The immutable panel container and state-selection helpers.
pub mod panel;
/// Typed row schema and named-column accessors.
pub mod row;

pub use group::{group_means, mean_where, MeanAccum};
pub use loader::{from_csv_path, from_csv_reader};
pub use panel::Panel;
pub use row::{Column, Covariate, Outcome, PanelRow};
