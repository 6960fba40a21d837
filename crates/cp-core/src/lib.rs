//! # cp-core
//!
//! Core types for CausalPanel: the error taxonomy shared by every
//! estimator, the coefficient-table row type, and the least-squares
//! backend trait.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{LeastSquaresFit, LeastSquaresSolver};
pub use types::CoefficientRow;
