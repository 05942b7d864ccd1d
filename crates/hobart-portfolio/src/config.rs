//! Formation configuration.

use crate::error::PortfolioError;
use serde::{Deserialize, Serialize};

/// Configuration for N-tile portfolio formation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationConfig {
    /// Number of buckets N (default: 5, quintiles)
    pub buckets: usize,
    /// Instruments a month needs before it is ranked (default: 20)
    pub min_instruments: usize,
    /// Threshold used when no month reaches `min_instruments` (default: N)
    pub lenient_min_instruments: Option<usize>,
    /// Months between ranking and investing (default: 1)
    pub lag: i32,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            buckets: 5,
            min_instruments: 20,
            lenient_min_instruments: None,
            lag: 1,
        }
    }
}

impl FormationConfig {
    /// Fail fast on configurations that cannot form portfolios.
    pub fn validate(&self) -> Result<(), PortfolioError> {
        if self.buckets <= 1 {
            return Err(PortfolioError::InvalidConfiguration(format!(
                "bucket count must exceed 1, got {}",
                self.buckets
            )));
        }
        if self.lag < 0 {
            return Err(PortfolioError::InvalidConfiguration(format!(
                "formation lag must be non-negative, got {}",
                self.lag
            )));
        }
        // Fewer names than buckets leaves bucket 1 empty and drops the long-short leg.
        if self.min_instruments < self.buckets {
            return Err(PortfolioError::InvalidConfiguration(format!(
                "min_instruments ({}) must be at least the bucket count ({})",
                self.min_instruments, self.buckets
            )));
        }
        if let Some(lenient) = self.lenient_min_instruments.filter(|&n| n < self.buckets) {
            return Err(PortfolioError::InvalidConfiguration(format!(
                "lenient_min_instruments ({lenient}) must be at least the bucket count ({})",
                self.buckets
            )));
        }
        Ok(())
    }

    /// Threshold for the lenient retry.
    pub fn lenient_threshold(&self) -> usize {
        self.lenient_min_instruments
            .unwrap_or(self.buckets)
            .min(self.min_instruments)
    }
}
