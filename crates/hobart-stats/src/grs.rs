//! Gibbons-Ross-Shanken test that a set of portfolio alphas is jointly zero.
//!
//! With T common months, k portfolios and L factors:
//!
//! ```text
//! Σ   = ε̂ᵀε̂ / (T − L − 1)
//! GRS = (T/k) · ((T − k − L)/(T − L − 1)) · α̂ᵀΣ⁻¹α̂ / (1 + μᵀΩ⁻¹μ)
//! GRS ~ F(k, T − k − L)
//! ```
//!
//! where μ and Ω are the sample mean and covariance of the factors.
//!
//! # References
//!
//! - Gibbons, M. R., Ross, S. A., & Shanken, J. (1989). "A Test of the
//!   Efficiency of a Given Portfolio." Econometrica, 57(5), 1121-1152.

use crate::{
    distribution::f_survival,
    error::StatsError,
    linalg::{covariance, inverse_quadratic_form},
    ols::{CovarianceType, ols},
    regression::RegressionResult,
    specification::Specification,
};
use derive_more::Display;
use hobart_data::{FactorTable, Month};
use hobart_portfolio::PortfolioId;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// GRS test configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrsConfig {
    /// Significance level for the conclusion (default: 0.05)
    pub significance: f64,
}

impl Default for GrsConfig {
    fn default() -> Self {
        Self { significance: 0.05 }
    }
}

impl GrsConfig {
    /// Reject unusable settings.
    pub fn validate(&self) -> Result<(), StatsError> {
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(StatsError::InvalidConfiguration(format!(
                "GRS significance must lie in (0, 1), got {}",
                self.significance
            )));
        }
        Ok(())
    }
}

/// Outcome of the joint test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointConclusion {
    /// Cannot reject that all alphas are zero
    #[display("jointly zero")]
    JointlyZero,
    /// Alphas are jointly different from zero
    #[display("jointly significant")]
    JointlySignificant,
}

/// Result of one GRS test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointTestResult {
    /// Specification shared by every tested regression
    pub specification: Specification,
    /// GRS F statistic
    pub f_statistic: f64,
    /// Upper-tail p-value
    pub p_value: f64,
    /// Numerator degrees of freedom (k)
    pub df1: usize,
    /// Denominator degrees of freedom (T − k − L)
    pub df2: usize,
    /// Tested portfolios
    pub portfolios: Vec<PortfolioId>,
    /// Common months (T)
    pub observations: usize,
    /// Conclusion at the configured significance
    pub conclusion: JointConclusion,
}

/// GRS joint alpha test.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrsTest {
    config: GrsConfig,
}

impl GrsTest {
    /// Create a tester.
    pub fn new(config: GrsConfig) -> Result<Self, StatsError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Test whether the alphas of `results` are jointly zero.
    ///
    /// The test runs over the months every result shares. A result fitted on
    /// more months than that is refitted on the shared months first.
    pub fn test(
        &self,
        results: &[RegressionResult],
        factors: &FactorTable,
    ) -> Result<JointTestResult, StatsError> {
        let Some(first) = results.first() else {
            return Err(StatsError::InvalidConfiguration(
                "GRS needs at least 2 portfolios, got 0".into(),
            ));
        };
        let k = results.len();
        if k < 2 {
            return Err(StatsError::InvalidConfiguration(format!(
                "GRS needs at least 2 portfolios, got {k}"
            )));
        }
        let specification = first.specification;
        if let Some(other) = results.iter().find(|r| r.specification != specification) {
            return Err(StatsError::InvalidConfiguration(format!(
                "mixed specifications {specification} and {}",
                other.specification
            )));
        }

        let names = specification.factors();
        let l = names.len();

        let mut common: BTreeSet<Month> = first.months.iter().copied().collect();
        for r in &results[1..] {
            let months: BTreeSet<Month> = r.months.iter().copied().collect();
            common = common.intersection(&months).copied().collect();
        }
        let months: Vec<Month> = common
            .into_iter()
            .filter(|m| factors.get(m).and_then(|f| f.regressors(names)).is_some())
            .collect();
        let t = months.len();

        if k > t {
            return Err(StatsError::SingularCovariance(format!(
                "{k} portfolios exceed {t} common months"
            )));
        }
        if t < k + l + 1 {
            return Err(StatsError::InsufficientData {
                required: k + l + 1,
                actual: t,
            });
        }

        let mut factor_data = Array2::<f64>::zeros((t, l));
        for (i, month) in months.iter().enumerate() {
            if let Some(row) = factors.get(month).and_then(|f| f.regressors(names)) {
                for (j, v) in row.into_iter().enumerate() {
                    factor_data[[i, j]] = v;
                }
            }
        }

        let mut residuals = Array2::<f64>::zeros((t, k));
        let mut alpha = Array1::<f64>::zeros(k);
        for (j, r) in results.iter().enumerate() {
            let (a, eps) = common_sample_fit(r, &months, &factor_data)?;
            alpha[j] = a;
            for (i, e) in eps.into_iter().enumerate() {
                residuals[[i, j]] = e;
            }
        }
        let sigma = residuals.t().dot(&residuals) / (t - l - 1) as f64;

        let mu: Array1<f64> = (0..l).map(|j| factor_data.column(j).sum() / t as f64).collect();
        let omega = covariance(&factor_data, (t - 1) as f64);

        let alpha_term = inverse_quadratic_form(&sigma, alpha.view()).ok_or_else(|| {
            StatsError::SingularCovariance("residual covariance is not positive definite".into())
        })?;
        let factor_term = inverse_quadratic_form(&omega, mu.view()).ok_or_else(|| {
            StatsError::SingularCovariance("factor covariance is not positive definite".into())
        })?;

        let (tf, kf, lf) = (t as f64, k as f64, l as f64);
        let f_statistic =
            (tf / kf) * ((tf - kf - lf) / (tf - lf - 1.0)) * alpha_term / (1.0 + factor_term);
        let df2 = t - k - l;
        let p_value = f_survival(f_statistic, kf, df2 as f64)?;

        let conclusion = if p_value < self.config.significance {
            JointConclusion::JointlySignificant
        } else {
            JointConclusion::JointlyZero
        };

        debug!(%specification, k, t, f_statistic, p_value, "GRS test");

        Ok(JointTestResult {
            specification,
            f_statistic,
            p_value,
            df1: k,
            df2,
            portfolios: results.iter().map(|r| r.portfolio).collect(),
            observations: t,
            conclusion,
        })
    }
}

/// Alpha and residuals of `result` over exactly `months`.
///
/// A result fitted on a longer sample is refitted on the common months from
/// its reconstructed excess returns, so that every column of the residual
/// matrix averages to zero over the same T.
fn common_sample_fit(
    result: &RegressionResult,
    months: &[Month],
    factor_data: &Array2<f64>,
) -> Result<(f64, Vec<f64>), StatsError> {
    if result.months == months {
        return Ok((result.alpha, result.residuals.clone()));
    }

    let betas: Vec<f64> = result
        .specification
        .factors()
        .iter()
        .map(|&name| result.loading(name).map_or(0.0, |l| l.estimate))
        .collect();
    let mut y = Array1::<f64>::zeros(months.len());
    for (i, month) in months.iter().enumerate() {
        let residual = result.residual(*month).ok_or_else(|| {
            StatsError::InvalidConfiguration(format!(
                "{} has no residual for {month}",
                result.portfolio
            ))
        })?;
        let explained: f64 = betas
            .iter()
            .zip(factor_data.row(i))
            .map(|(b, f)| b * f)
            .sum();
        y[i] = result.alpha + explained + residual;
    }

    debug!(
        portfolio = %result.portfolio,
        fitted = result.months.len(),
        common = months.len(),
        "Refitting on common months"
    );
    let fit = ols(&y, factor_data, CovarianceType::Classical).map_err(|e| match e {
        StatsError::SingularDesign(_) => StatsError::SingularCovariance(format!(
            "factors are collinear over the {} common months",
            months.len()
        )),
        other => other,
    })?;
    Ok((fit.coefficients[0], fit.residuals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regression::FactorRegression;
    use approx::assert_relative_eq;
    use hobart_data::FactorObservation;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};

    fn month(k: i32) -> Month {
        Month::new(2000, 1).unwrap().add_months(k)
    }

    fn setup(t: i32, alphas: &[f64]) -> (FactorTable, Vec<RegressionResult>) {
        let mut rng = StdRng::seed_from_u64(17);
        let market = Normal::new(0.005, 0.04).unwrap();
        let noise = Normal::new(0.0, 0.01).unwrap();

        let factors = FactorTable::new(
            (0..t).map(|k| FactorObservation::market_only(month(k), market.sample(&mut rng), 0.0)),
        )
        .unwrap();
        let engine = FactorRegression::default();
        let results = alphas
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let returns: Vec<(Month, f64)> = factors
                    .iter()
                    .map(|f| (f.month, a + 0.9 * f.market_excess + noise.sample(&mut rng)))
                    .collect();
                engine
                    .fit_series(PortfolioId::Bucket(i + 1), &returns, &factors, Specification::Capm)
                    .unwrap()
            })
            .collect();
        (factors, results)
    }

    #[test]
    fn test_matches_direct_formula() {
        let (factors, results) = setup(60, &[0.001, -0.002, 0.0005]);
        let grs = GrsTest::default().test(&results, &factors).unwrap();

        assert_eq!(grs.df1, 3);
        assert_eq!(grs.df2, 60 - 3 - 1);
        assert_eq!(grs.observations, 60);

        // Recompute with explicit inverses for a single-factor model.
        let t = 60.0;
        let mkt: Vec<f64> = factors.iter().map(|f| f.market_excess).collect();
        let mu = mkt.iter().sum::<f64>() / t;
        let var = mkt.iter().map(|m| (m - mu).powi(2)).sum::<f64>() / (t - 1.0);
        let mut sigma = Array2::<f64>::zeros((3, 3));
        for i in 0..3 {
            for j in 0..3 {
                sigma[[i, j]] = results[i]
                    .residuals
                    .iter()
                    .zip(&results[j].residuals)
                    .map(|(a, b)| a * b)
                    .sum::<f64>()
                    / (t - 2.0);
            }
        }
        let alpha = Array1::from_iter(results.iter().map(|r| r.alpha));
        let quad = inverse_quadratic_form(&sigma, alpha.view()).unwrap();
        let expected = (t / 3.0) * ((t - 4.0) / (t - 2.0)) * quad / (1.0 + mu * mu / var);
        assert_relative_eq!(grs.f_statistic, expected, epsilon = 1e-10);
        assert!(grs.p_value > 0.0 && grs.p_value <= 1.0);
    }

    #[test]
    fn test_longer_sample_is_refitted_on_common_months() {
        let mut rng = StdRng::seed_from_u64(29);
        let market = Normal::new(0.005, 0.04).unwrap();
        let noise = Normal::new(0.0, 0.01).unwrap();
        let factors = FactorTable::new(
            (0..120).map(|k| FactorObservation::market_only(month(k), market.sample(&mut rng), 0.0)),
        )
        .unwrap();

        // Only the first portfolio has a late alpha, outside the common window.
        let series: Vec<Vec<(Month, f64)>> = (0..3)
            .map(|i| {
                factors
                    .iter()
                    .map(|f| {
                        let alpha = if i == 0 && f.month >= month(60) { 0.02 } else { 0.0 };
                        (f.month, alpha + 0.9 * f.market_excess + noise.sample(&mut rng))
                    })
                    .collect()
            })
            .collect();
        let engine = FactorRegression::default();
        let fit = |i: usize, n: usize| {
            engine
                .fit_series(PortfolioId::Bucket(i + 1), &series[i][..n], &factors, Specification::Capm)
                .unwrap()
        };

        let mixed = vec![fit(0, 120), fit(1, 60), fit(2, 60)];
        let aligned = vec![fit(0, 60), fit(1, 60), fit(2, 60)];
        let grs_mixed = GrsTest::default().test(&mixed, &factors).unwrap();
        let grs_aligned = GrsTest::default().test(&aligned, &factors).unwrap();

        assert_eq!(grs_mixed.observations, 60);
        assert_eq!(grs_mixed.df2, grs_aligned.df2);
        assert_relative_eq!(grs_mixed.f_statistic, grs_aligned.f_statistic, max_relative = 1e-8);
        assert_relative_eq!(grs_mixed.p_value, grs_aligned.p_value, max_relative = 1e-6);
        assert_eq!(grs_mixed.conclusion, grs_aligned.conclusion);
    }

    #[test]
    fn test_requires_two_portfolios() {
        let (factors, results) = setup(40, &[0.0]);
        assert!(matches!(
            GrsTest::default().test(&results, &factors),
            Err(StatsError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            GrsTest::default().test(&[], &factors),
            Err(StatsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_mixed_specifications_rejected() {
        let (factors, mut results) = setup(40, &[0.0, 0.0]);
        results[1].specification = Specification::ThreeFactor;
        assert!(matches!(
            GrsTest::default().test(&results, &factors),
            Err(StatsError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_identical_portfolios_are_singular() {
        let (factors, mut results) = setup(40, &[0.001, 0.0]);
        results[1] = results[0].clone();
        results[1].portfolio = PortfolioId::Bucket(2);
        assert!(matches!(
            GrsTest::default().test(&results, &factors),
            Err(StatsError::SingularCovariance(_))
        ));
    }

    #[test]
    fn test_more_portfolios_than_months() {
        let (factors, mut results) = setup(14, &[0.0; 15]);
        for r in &mut results {
            r.months.truncate(12);
            r.residuals.truncate(12);
        }
        results.truncate(13);
        assert!(matches!(
            GrsTest::default().test(&results, &factors),
            Err(StatsError::SingularCovariance(_))
        ));
    }

    #[test]
    fn test_too_few_degrees_of_freedom() {
        let (factors, mut results) = setup(14, &[0.0; 13]);
        for r in &mut results {
            r.months.truncate(12);
            r.residuals.truncate(12);
        }
        results.truncate(12);
        // k = 12, L = 1, T = 12 -> T − k − L < 1
        assert_eq!(
            GrsTest::default().test(&results, &factors).unwrap_err(),
            StatsError::InsufficientData {
                required: 14,
                actual: 12
            }
        );
    }

    #[test]
    fn test_invalid_significance() {
        assert!(GrsTest::new(GrsConfig { significance: 1.5 }).is_err());
    }
}
