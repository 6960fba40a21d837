//! Error types for CausalPanel

use thiserror::Error;

/// CausalPanel error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// A requested group has zero usable observations
    #[error("Empty group: {0}")]
    EmptyGroup(String),

    /// Design matrix is singular or under-determined
    #[error("Rank deficiency: {0}")]
    RankDeficiency(String),

    /// Too few observations for the requested test
    #[error("Insufficient sample: {0}")]
    InsufficientSample(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
