//! Screened log returns.

use super::VolatilityConfig;
use chrono::NaiveDate;
use hobart_data::DatedPrice;
use serde::{Deserialize, Serialize};

/// One log return, dated at the later of its two prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnObservation {
    /// Date of the closing price that ends the return
    pub date: NaiveDate,
    /// ln(p_t / p_{t-1})
    pub value: f64,
    /// False when the return touches a sub-floor price or is implausibly large
    pub valid: bool,
}

/// Ordered log returns of one instrument.
///
/// Screened-out returns stay in the series with `valid = false`, so window
/// positions keep lining up with trading days.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnSeries {
    observations: Vec<ReturnObservation>,
}

impl ReturnSeries {
    /// All returns, valid or not.
    pub fn observations(&self) -> &[ReturnObservation] {
        &self.observations
    }

    /// Number of returns.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series is empty.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of returns that passed screening.
    pub fn valid_count(&self) -> usize {
        self.observations.iter().filter(|r| r.valid).count()
    }

    /// Rebuild the price path from `start` by compounding every return.
    ///
    /// The first element is `start` itself.
    pub fn reconstruct_prices(&self, start: f64) -> Vec<f64> {
        let mut prices = Vec::with_capacity(self.observations.len() + 1);
        prices.push(start);
        let mut log_level = start.ln();
        for r in &self.observations {
            log_level += r.value;
            prices.push(log_level.exp());
        }
        prices
    }
}

/// Compute screened log returns from a chronologically ordered price history.
pub fn log_returns(prices: &[DatedPrice], config: &VolatilityConfig) -> ReturnSeries {
    let max_abs = config.extreme_return_multiple.ln();

    let observations = prices
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0], w[1]);
            let value = (curr.price / prev.price).ln();
            let valid = prev.price >= config.min_price
                && curr.price >= config.min_price
                && value.is_finite()
                && value.abs() <= max_abs;
            ReturnObservation {
                date: curr.date,
                value,
                valid,
            }
        })
        .collect();

    ReturnSeries { observations }
}
