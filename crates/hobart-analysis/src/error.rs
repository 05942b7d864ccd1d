//! Error types for the analysis pipeline.

use hobart_data::DataError;
use hobart_portfolio::PortfolioError;
use hobart_signals::SignalError;
use hobart_stats::StatsError;
use thiserror::Error;

/// Errors raised while running an analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input data could not be read or validated
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Volatility estimation failed
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    /// Portfolio formation failed
    #[error("Portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    /// A statistical computation failed
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    /// Not enough data to analyze a portfolio at all
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
