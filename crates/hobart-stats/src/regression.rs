//! Factor regressions of portfolio excess returns.

use crate::{
    error::StatsError,
    ols::{CovarianceType, ols},
    specification::Specification,
};
use hobart_data::{FactorName, FactorTable, Month};
use hobart_portfolio::{PortfolioId, PortfolioReturn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Smallest sample a regression may be fit on.
pub const HARD_MIN_OBSERVATIONS: usize = 12;

/// Regression engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Aligned months required to fit (default: 12, never below 12)
    pub min_observations: usize,
    /// Samples below this size are fit but logged (default: 36)
    pub recommended_observations: usize,
    /// Standard error estimator (default: classical)
    pub covariance: CovarianceType,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            min_observations: HARD_MIN_OBSERVATIONS,
            recommended_observations: 36,
            covariance: CovarianceType::Classical,
        }
    }
}

impl RegressionConfig {
    /// Reject unusable settings.
    pub fn validate(&self) -> Result<(), StatsError> {
        if self.min_observations < HARD_MIN_OBSERVATIONS {
            return Err(StatsError::InvalidConfiguration(format!(
                "min_observations must be at least {HARD_MIN_OBSERVATIONS}, got {}",
                self.min_observations
            )));
        }
        Ok(())
    }
}

/// Estimated exposure to one factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorLoading {
    /// Factor
    pub factor: FactorName,
    /// Slope estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: f64,
    /// t statistic
    pub t_stat: f64,
    /// Two-sided p-value
    pub p_value: f64,
}

/// One portfolio regressed on one specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    /// Portfolio
    pub portfolio: PortfolioId,
    /// Specification
    pub specification: Specification,
    /// Intercept (monthly)
    pub alpha: f64,
    /// Standard error of alpha
    pub alpha_std_error: f64,
    /// t statistic of alpha
    pub alpha_t_stat: f64,
    /// Two-sided p-value of alpha
    pub alpha_p_value: f64,
    /// Factor slopes in specification order
    pub loadings: Vec<FactorLoading>,
    /// R²
    pub r_squared: f64,
    /// Adjusted R²
    pub adj_r_squared: f64,
    /// Residual standard error
    pub residual_std_error: f64,
    /// Sample size
    pub observations: usize,
    /// Months in the aligned sample, ascending
    pub months: Vec<Month>,
    /// Residuals aligned with `months`
    pub residuals: Vec<f64>,
}

impl RegressionResult {
    /// Loading on `factor`, if the specification includes it.
    pub fn loading(&self, factor: FactorName) -> Option<&FactorLoading> {
        self.loadings.iter().find(|l| l.factor == factor)
    }

    /// Residual in `month`, if it is part of the sample.
    pub fn residual(&self, month: Month) -> Option<f64> {
        self.months
            .binary_search(&month)
            .ok()
            .map(|i| self.residuals[i])
    }
}

/// Fits factor specifications against a fixed factor table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactorRegression {
    config: RegressionConfig,
}

impl FactorRegression {
    /// Create a regression engine.
    pub fn new(config: RegressionConfig) -> Result<Self, StatsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub const fn config(&self) -> &RegressionConfig {
        &self.config
    }

    /// Regress excess returns of `returns` on the factors of `specification`.
    ///
    /// Months without factor data, or without every factor the
    /// specification needs, are dropped.
    pub fn fit(
        &self,
        portfolio: PortfolioId,
        returns: &[PortfolioReturn],
        factors: &FactorTable,
        specification: Specification,
    ) -> Result<RegressionResult, StatsError> {
        let series: Vec<(Month, f64)> = returns.iter().map(|r| (r.month, r.value)).collect();
        self.fit_series(portfolio, &series, factors, specification)
    }

    /// As [`FactorRegression::fit`] for a bare `(month, return)` series.
    pub fn fit_series(
        &self,
        portfolio: PortfolioId,
        returns: &[(Month, f64)],
        factors: &FactorTable,
        specification: Specification,
    ) -> Result<RegressionResult, StatsError> {
        let names = specification.factors();

        let mut aligned: Vec<(Month, f64, Vec<f64>)> = returns
            .iter()
            .filter_map(|(month, value)| {
                let row = factors.get(month)?;
                let x = row.regressors(names)?;
                Some((*month, value - row.risk_free, x))
            })
            .collect();
        aligned.sort_by_key(|(month, _, _)| *month);
        aligned.dedup_by_key(|(month, _, _)| *month);

        let n = aligned.len();
        let required = self.config.min_observations.max(names.len() + 2);
        if n < required {
            debug!(%portfolio, %specification, n, required, "Aligned sample too small");
            return Err(StatsError::InsufficientData {
                required,
                actual: n,
            });
        }
        if n < self.config.recommended_observations {
            warn!(
                %portfolio,
                %specification,
                n,
                recommended = self.config.recommended_observations,
                "Regression sample below recommended size"
            );
        }

        let y = Array1::from_iter(aligned.iter().map(|(_, v, _)| *v));
        let mut x = Array2::<f64>::zeros((n, names.len()));
        for (i, (_, _, row)) in aligned.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                x[[i, j]] = *value;
            }
        }

        let fit = ols(&y, &x, self.config.covariance).map_err(|e| match e {
            StatsError::SingularDesign(_) => {
                StatsError::SingularDesign(format!("{portfolio} under {specification}"))
            }
            other => other,
        })?;

        let loadings = names
            .iter()
            .enumerate()
            .map(|(j, factor)| FactorLoading {
                factor: *factor,
                estimate: fit.coefficients[j + 1],
                std_error: fit.std_errors[j + 1],
                t_stat: fit.t_stats[j + 1],
                p_value: fit.p_values[j + 1],
            })
            .collect();

        debug!(
            %portfolio,
            %specification,
            n,
            alpha = fit.coefficients[0],
            r_squared = fit.r_squared,
            "Fitted factor regression"
        );

        Ok(RegressionResult {
            portfolio,
            specification,
            alpha: fit.coefficients[0],
            alpha_std_error: fit.std_errors[0],
            alpha_t_stat: fit.t_stats[0],
            alpha_p_value: fit.p_values[0],
            loadings,
            r_squared: fit.r_squared,
            adj_r_squared: fit.adj_r_squared,
            residual_std_error: fit.sigma,
            observations: n,
            months: aligned.into_iter().map(|(month, _, _)| month).collect(),
            residuals: fit.residuals,
        })
    }
}
