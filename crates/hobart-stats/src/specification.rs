//! Nested factor model specifications.
//!
//! Each specification is nothing more than a choice of regressor columns; the
//! estimation itself is shared.

use derive_more::Display;
use hobart_data::FactorName;
use serde::{Deserialize, Serialize};

/// A factor model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specification {
    /// Market factor only
    #[display("CAPM")]
    Capm,
    /// Market, size and value
    #[display("FF3")]
    ThreeFactor,
    /// Market, size, value, profitability and investment
    #[display("FF5")]
    FiveFactor,
}

impl Specification {
    /// All specifications from simplest to richest.
    pub const ALL: [Self; 3] = [Self::Capm, Self::ThreeFactor, Self::FiveFactor];

    /// Regressor columns, in order.
    pub const fn factors(&self) -> &'static [FactorName] {
        match self {
            Self::Capm => &[FactorName::Market],
            Self::ThreeFactor => &[FactorName::Market, FactorName::Size, FactorName::Value],
            Self::FiveFactor => &[
                FactorName::Market,
                FactorName::Size,
                FactorName::Value,
                FactorName::Profitability,
                FactorName::Investment,
            ],
        }
    }

    /// Number of factors (excluding the intercept).
    pub const fn factor_count(&self) -> usize {
        self.factors().len()
    }
}
