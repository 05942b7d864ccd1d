//! Ordinary least squares with an intercept.
//!
//! The design matrix is factored with Householder QR rather than by forming
//! and inverting XᵀX, which keeps estimates stable when factors are strongly
//! correlated (as SMB/HML/RMW/CMA often are).
//!
//! Standard errors are either classical, σ²(XᵀX)⁻¹ with σ² = SSR/(n−p), or
//! Newey-West HAC:
//!
//! ```text
//! V = n/(n−p) · (XᵀX)⁻¹ S (XᵀX)⁻¹
//! S = Σ_t e_t² x_t x_tᵀ + Σ_{l=1..L} w_l Σ_{t>l} e_t e_{t−l} (x_t x_{t−l}ᵀ + x_{t−l} x_tᵀ)
//! w_l = 1 − l/(L+1)
//! ```
//!
//! with L = ceil(4·(n/100)^(2/9)) unless given explicitly.

use crate::{
    distribution::student_t_two_sided,
    error::StatsError,
    linalg::QrDecomposition,
};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// How coefficient standard errors are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CovarianceType {
    /// Homoskedastic, serially uncorrelated errors
    #[default]
    Classical,
    /// Heteroskedasticity and autocorrelation consistent (Bartlett kernel)
    NeweyWest {
        /// Maximum lag; automatic when `None`
        lags: Option<usize>,
    },
}

impl CovarianceType {
    /// Lag truncation used for `n` observations (0 for classical).
    pub fn lags_for(&self, n: usize) -> usize {
        match self {
            Self::Classical => 0,
            Self::NeweyWest { lags: Some(l) } => *l,
            Self::NeweyWest { lags: None } => {
                (4.0 * (n as f64 / 100.0).powf(2.0 / 9.0)).ceil() as usize
            }
        }
    }
}

/// Result of one least-squares fit. Index 0 of every coefficient vector is
/// the intercept; the rest follow the column order of the regressors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    /// Point estimates
    pub coefficients: Vec<f64>,
    /// Standard errors
    pub std_errors: Vec<f64>,
    /// t statistics
    pub t_stats: Vec<f64>,
    /// Two-sided p-values with `df_resid` degrees of freedom
    pub p_values: Vec<f64>,
    /// Coefficient of determination
    pub r_squared: f64,
    /// R² adjusted for the number of regressors
    pub adj_r_squared: f64,
    /// Residual standard error √(SSR/(n−p))
    pub sigma: f64,
    /// Residuals in observation order
    pub residuals: Vec<f64>,
    /// Number of observations
    pub n: usize,
    /// Residual degrees of freedom n − p
    pub df_resid: usize,
}

/// Regress `y` on an intercept plus the columns of `x`.
///
/// # Errors
///
/// - [`StatsError::InsufficientData`] when fewer than p + 1 observations are
///   available (p counts the intercept)
/// - [`StatsError::SingularDesign`] when the columns are linearly dependent
/// - [`StatsError::InvalidConfiguration`] when `y` and `x` disagree in length
///   or contain non-finite values
pub fn ols(y: &Array1<f64>, x: &Array2<f64>, covariance: CovarianceType) -> Result<OlsFit, StatsError> {
    let n = y.len();
    let p = x.ncols() + 1;

    if x.nrows() != n {
        return Err(StatsError::InvalidConfiguration(format!(
            "response has {n} rows but regressors have {}",
            x.nrows()
        )));
    }
    if y.iter().chain(x.iter()).any(|v| !v.is_finite()) {
        return Err(StatsError::InvalidConfiguration("non-finite value in regression input".into()));
    }
    if n < p + 1 {
        return Err(StatsError::InsufficientData {
            required: p + 1,
            actual: n,
        });
    }

    let mut design = Array2::<f64>::ones((n, p));
    design.slice_mut(ndarray::s![.., 1..]).assign(x);

    let singular = || StatsError::SingularDesign(format!("{} regressors", p - 1));
    let qr = QrDecomposition::new(&design).ok_or_else(singular)?;
    let beta = qr.solve(y.view()).ok_or_else(singular)?;
    let gram_inv = qr.gram_inverse().ok_or_else(singular)?;

    let fitted = design.dot(&beta);
    let residuals: Array1<f64> = y - &fitted;
    let df_resid = n - p;
    let ssr = residuals.dot(&residuals);
    let sigma2 = ssr / df_resid as f64;

    let y_mean = y.mean().unwrap_or(0.0);
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df_resid as f64;

    let cov = match covariance {
        CovarianceType::Classical => &gram_inv * sigma2,
        CovarianceType::NeweyWest { .. } => {
            let lags = covariance.lags_for(n).min(n - 1);
            let meat = hac_meat(&design, &residuals, lags);
            gram_inv.dot(&meat).dot(&gram_inv) * (n as f64 / df_resid as f64)
        }
    };

    let std_errors: Vec<f64> = cov.diag().iter().map(|v| v.max(0.0).sqrt()).collect();
    let t_stats: Vec<f64> = beta
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| if *se > 0.0 { b / se } else { f64::NAN })
        .collect();
    let p_values = t_stats
        .iter()
        .map(|t| student_t_two_sided(*t, df_resid as f64))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OlsFit {
        coefficients: beta.to_vec(),
        std_errors,
        t_stats,
        p_values,
        r_squared,
        adj_r_squared,
        sigma: sigma2.sqrt(),
        residuals: residuals.to_vec(),
        n,
        df_resid,
    })
}

/// Bartlett-weighted long-run covariance of the score x_t·e_t.
fn hac_meat(design: &Array2<f64>, residuals: &Array1<f64>, lags: usize) -> Array2<f64> {
    let p = design.ncols();
    let mut scores = design.clone();
    for (mut row, e) in scores.axis_iter_mut(Axis(0)).zip(residuals) {
        row *= *e;
    }

    let mut meat = scores.t().dot(&scores);
    let n = scores.nrows();
    for lag in 1..=lags {
        let weight = 1.0 - lag as f64 / (lags as f64 + 1.0);
        let current = scores.slice(ndarray::s![lag.., ..]);
        let lagged = scores.slice(ndarray::s![..n - lag, ..]);
        let gamma = current.t().dot(&lagged);
        for i in 0..p {
            for j in 0..p {
                meat[[i, j]] += weight * (gamma[[i, j]] + gamma[[j, i]]);
            }
        }
    }
    meat
}
