#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod volatility;

pub use volatility::{
    ReturnObservation, ReturnSeries, RollingVolatility, Sampling, VolatilityConfig,
    VolatilityPoint, log_returns,
};

use thiserror::Error;

/// Errors raised while configuring or running signal estimators.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Configuration cannot produce valid estimates
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Rolling computation failed inside polars
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
