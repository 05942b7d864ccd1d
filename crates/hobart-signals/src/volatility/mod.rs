//! Volatility signals - trailing realized risk used to rank instruments
//!
//! Lower volatility securities have historically earned higher risk-adjusted
//! returns than CAPM predicts (the low-volatility anomaly). This module
//! produces the point-in-time volatility estimates used to sort on it.

pub mod historical_vol;
pub mod returns;

pub use historical_vol::{RollingVolatility, VolatilityPoint};
pub use returns::{ReturnObservation, ReturnSeries, log_returns};

use crate::SignalError;
use serde::{Deserialize, Serialize};

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Which window ends produce a [`VolatilityPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sampling {
    /// Every trading day with a full window
    #[default]
    Daily,
    /// Only the last trading day of each calendar month
    MonthEnd,
}

/// Configuration for the rolling volatility estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// Window length in return observations (default: 252 trading days)
    pub window: usize,
    /// Fraction of the window that must hold valid returns (default: 0.8)
    pub min_coverage: f64,
    /// Returns with |r| > ln(multiple) are screened out (default: 3.0)
    pub extreme_return_multiple: f64,
    /// Returns touching a price below this floor are screened out (default: 1.0)
    pub min_price: f64,
    /// Extra price observations required beyond `window` (default: 1)
    pub history_buffer: usize,
    /// Emission schedule (default: daily)
    pub sampling: Sampling,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            window: 252,
            min_coverage: 0.8,
            extreme_return_multiple: 3.0,
            min_price: 1.0,
            history_buffer: 1,
            sampling: Sampling::Daily,
        }
    }
}

impl VolatilityConfig {
    /// Reject configurations that cannot produce meaningful estimates.
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.window < 2 {
            return Err(SignalError::InvalidConfiguration(format!(
                "window must be at least 2, got {}",
                self.window
            )));
        }
        if !(self.min_coverage > 0.0 && self.min_coverage <= 1.0) {
            return Err(SignalError::InvalidConfiguration(format!(
                "min_coverage must be in (0, 1], got {}",
                self.min_coverage
            )));
        }
        if !(self.extreme_return_multiple > 1.0) {
            return Err(SignalError::InvalidConfiguration(format!(
                "extreme_return_multiple must exceed 1, got {}",
                self.extreme_return_multiple
            )));
        }
        if !(self.min_price >= 0.0) {
            return Err(SignalError::InvalidConfiguration(format!(
                "min_price must be non-negative, got {}",
                self.min_price
            )));
        }
        Ok(())
    }

    /// Minimum number of valid returns in a window: ceil(window × coverage), at least 2.
    pub fn min_valid(&self) -> usize {
        let required = (self.window as f64 * self.min_coverage - 1e-9).ceil() as usize;
        required.max(2)
    }

    /// Minimum price observations an instrument needs before any estimate.
    pub const fn min_history(&self) -> usize {
        self.window + self.history_buffer
    }
}
