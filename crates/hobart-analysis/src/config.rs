//! Run configuration.
//!
//! Every stage keeps its own config type; [`AnalysisConfig`] only groups them
//! so a single JSON document can describe a run. Missing fields take their
//! defaults:
//!
//! ```json
//! {
//!   "volatility": { "window": 126 },
//!   "formation": { "buckets": 10, "lag": 1 },
//!   "regression": { "covariance": { "type": "newey_west", "lags": null } }
//! }
//! ```

use crate::error::{AnalysisError, Result};
use hobart_portfolio::FormationConfig;
use hobart_signals::VolatilityConfig;
use hobart_stats::{GrsConfig, RegressionConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Alpha aggregator configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Significance level for raw and alpha tests (default: 0.05)
    pub significance: f64,
    /// R² differences up to this size count as ties (default: 1e-12)
    pub tie_tolerance: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            significance: 0.05,
            tie_tolerance: 1e-12,
        }
    }
}

impl AggregatorConfig {
    /// Reject unusable settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "significance must lie in (0, 1), got {}",
                self.significance
            )));
        }
        if !(self.tie_tolerance >= 0.0) {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "tie_tolerance must be non-negative, got {}",
                self.tie_tolerance
            )));
        }
        Ok(())
    }
}

/// Settings for a complete analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rolling volatility estimator
    pub volatility: VolatilityConfig,
    /// N-tile formation
    pub formation: FormationConfig,
    /// Factor regressions
    pub regression: RegressionConfig,
    /// GRS joint test
    pub grs: GrsConfig,
    /// Model selection and classification
    pub aggregator: AggregatorConfig,
}

impl AnalysisConfig {
    /// Validate every stage.
    pub fn validate(&self) -> Result<()> {
        self.volatility.validate()?;
        self.formation.validate()?;
        self.regression.validate()?;
        self.grs.validate()?;
        self.aggregator.validate()
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
