//! Error handling for the regression pipeline
//!
//! A single error enum shared by parameter selection, the SHE layer and the
//! regression engine. Silent noise overflow is never reported here: an
//! undersized modulus chain yields wrong plaintexts, not an error.

use thiserror::Error;

/// Errors raised by the regression pipeline.
#[derive(Debug, Error)]
pub enum RegressionError {
    /// Rejected configuration (bad prime, generator, ring size, ...).
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Malformed or unreadable dataset file.
    #[error("dataset load failed: {0}")]
    DatasetLoad(String),

    /// Operation called in the wrong engine state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Strict depth tracking found no level left for the requested operation.
    #[error("depth budget exhausted during {0}")]
    DepthBudgetExhausted(&'static str),

    /// No key-switching key was generated for the requested operation.
    #[error("missing key-switching key: {0}")]
    MissingKey(String),

    /// Operands or inputs do not agree in shape, level or modulus.
    #[error("mismatch: {0}")]
    Mismatch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, RegressionError>;

/// Create an `InvalidParameters` error with format string support
macro_rules! param_err {
    ($($arg:tt)*) => {
        $crate::error::RegressionError::InvalidParameters(format!($($arg)*))
    };
}

/// Create a `Mismatch` error with format string support
macro_rules! mismatch_err {
    ($($arg:tt)*) => {
        $crate::error::RegressionError::Mismatch(format!($($arg)*))
    };
}

pub(crate) use mismatch_err;
pub(crate) use param_err;
