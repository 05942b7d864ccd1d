//! Raw performance statistics of a monthly return series.

use crate::{distribution::student_t_two_sided, error::StatsError};
use hobart_data::FactorTable;
use hobart_portfolio::PortfolioReturn;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Months per year used for annualization.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Mean, volatility, Sharpe ratio and a one-sample t-test of the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of months
    pub observations: usize,
    /// Mean monthly return
    pub mean: f64,
    /// Monthly standard deviation (n − 1 divisor)
    pub std_dev: f64,
    /// std_dev × √12
    pub annualized_volatility: f64,
    /// Annualized Sharpe ratio of returns in excess of the risk-free rate
    pub sharpe_ratio: f64,
    /// t statistic of the mean against zero
    pub t_stat: f64,
    /// Two-sided p-value with n − 1 degrees of freedom
    pub p_value: f64,
}

impl SeriesSummary {
    /// Summarize `returns`; `risk_free` is matched element-wise for the Sharpe ratio.
    pub fn new(returns: &[f64], risk_free: &[f64]) -> Result<Self, StatsError> {
        let n = returns.len();
        if n < 2 {
            return Err(StatsError::InsufficientData {
                required: 2,
                actual: n,
            });
        }
        if risk_free.len() != n {
            return Err(StatsError::InvalidConfiguration(format!(
                "{n} returns but {} risk-free rates",
                risk_free.len()
            )));
        }

        let (mean, std_dev) = (returns.mean(), returns.std_dev());
        let excess: Vec<f64> = returns.iter().zip(risk_free).map(|(r, rf)| r - rf).collect();
        let (excess_mean, excess_std) = (excess.as_slice().mean(), excess.as_slice().std_dev());

        let sharpe_ratio = if excess_std > 0.0 {
            excess_mean / excess_std * MONTHS_PER_YEAR.sqrt()
        } else {
            0.0
        };
        let t_stat = if std_dev > 0.0 {
            mean / (std_dev / (n as f64).sqrt())
        } else if mean == 0.0 {
            0.0
        } else {
            f64::INFINITY.copysign(mean)
        };
        let p_value = student_t_two_sided(t_stat, (n - 1) as f64)?;

        Ok(Self {
            observations: n,
            mean,
            std_dev,
            annualized_volatility: std_dev * MONTHS_PER_YEAR.sqrt(),
            sharpe_ratio,
            t_stat,
            p_value,
        })
    }

    /// Summarize the months of `returns` that also appear in `factors`.
    pub fn aligned(returns: &[PortfolioReturn], factors: &FactorTable) -> Result<Self, StatsError> {
        let (values, risk_free): (Vec<f64>, Vec<f64>) = returns
            .iter()
            .filter_map(|r| factors.get(&r.month).map(|f| (r.value, f.risk_free)))
            .unzip();
        Self::new(&values, &risk_free)
    }
}
