//! Error types for portfolio formation.

use thiserror::Error;

/// Errors raised by the formation engine.
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Configuration cannot form portfolios
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Not enough instruments in any month, even with the lenient threshold
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}
