//! Error types for regression and joint testing.

use thiserror::Error;

/// Errors raised by the statistics layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    /// Too few aligned observations for the requested estimate
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Regressor matrix is rank deficient
    #[error("Singular design matrix for {0}")]
    SingularDesign(String),

    /// Residual or factor covariance is not positive definite
    #[error("Singular covariance matrix: {0}")]
    SingularCovariance(String),

    /// Configuration or input combination is not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A distribution could not be constructed for the given parameters
    #[error("Distribution error: {0}")]
    Distribution(String),
}
