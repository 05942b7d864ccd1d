//! Error types for data operations.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while building or loading input tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Non-positive or non-finite adjusted price
    #[error("Invalid price for {symbol} on {date}: {price}")]
    InvalidPrice {
        /// Instrument identifier
        symbol: String,
        /// Observation date
        date: NaiveDate,
        /// Offending price
        price: f64,
    },

    /// The same instrument/date pair appears twice
    #[error("Duplicate observation for {symbol} on {date}")]
    DuplicateObservation {
        /// Instrument identifier
        symbol: String,
        /// Observation date
        date: NaiveDate,
    },

    /// The same factor month appears twice
    #[error("Duplicate factor observation for {0}")]
    DuplicateMonth(String),

    /// Non-finite factor value
    #[error("Invalid factor value in {month}: {column} = {value}")]
    InvalidFactor {
        /// Month of the observation
        month: String,
        /// Column name
        column: &'static str,
        /// Offending value
        value: f64,
    },
}
