//! # cp-estimators
//!
//! Treatment-effect estimators for state-year crime panels.
//!
//! This crate provides the four estimation layers of the analysis, in
//! ascending order of how much panel structure they exploit:
//! - naive pooled pre/post ATE with a two-sample significance test
//! - per-state conditional effects (CATE), all-history or matched-year
//! - four-cell difference-in-differences
//! - OLS with state/year fixed effects and cluster-robust standard errors
//!
//! ## Architecture
//!
//! Estimators consume an immutable `cp_panel::Panel` and the shared
//! grouping engine; the regression talks to its linear-algebra backend
//! through the `LeastSquaresSolver` trait from cp-core, not to a concrete
//! matrix library.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Conditional average treatment effects per state.
pub mod cate;
/// Descriptive Pearson correlation matrix.
pub mod corr;
/// Difference-in-differences.
pub mod did;
/// Fixed-effects regression with cluster-robust inference.
pub mod fe;
/// Naive pre/post estimator and its significance test.
pub mod naive;
/// Dense OLS backend and sandwich covariance.
pub mod ols;
/// Two-sample location tests.
pub mod ttest;

pub use cate::{cate_all_history, cate_matched_years, CateResult, MatchedYears, StateEffect};
pub use corr::{correlation_matrix, CorrelationMatrix};
pub use did::{did, did_for_doctrine_year, DidResult};
pub use fe::{fit_fe_model, fit_fe_model_with, FeFit};
pub use naive::{average_treatment_effect, significance_test};
pub use ols::{cluster_robust_covariance, DenseOlsSolver};
pub use ttest::{welch_t_test, TwoSampleTest};
