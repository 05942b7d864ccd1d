//! Monthly systematic risk factor returns.
//!
//! Columns follow the Fama-French naming: market excess return (`mkt_rf`),
//! size (`smb`), value (`hml`), profitability (`rmw`), investment (`cma`) and
//! the risk-free rate (`rf`). Only the market and risk-free columns are
//! mandatory.

use crate::error::{DataError, Result};
use crate::month::Month;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named regressor column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorName {
    /// Market excess return
    #[display("mkt_rf")]
    Market,
    /// Small minus big
    #[display("smb")]
    Size,
    /// High minus low book-to-market
    #[display("hml")]
    Value,
    /// Robust minus weak profitability
    #[display("rmw")]
    Profitability,
    /// Conservative minus aggressive investment
    #[display("cma")]
    Investment,
}

impl FactorName {
    /// All factors in canonical column order.
    pub const ALL: [Self; 5] = [
        Self::Market,
        Self::Size,
        Self::Value,
        Self::Profitability,
        Self::Investment,
    ];
}

/// One month of factor returns, in decimal units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorObservation {
    /// Observation month
    pub month: Month,
    /// Market return in excess of the risk-free rate
    pub market_excess: f64,
    /// Size factor
    pub size: Option<f64>,
    /// Value factor
    pub value: Option<f64>,
    /// Profitability factor
    pub profitability: Option<f64>,
    /// Investment factor
    pub investment: Option<f64>,
    /// Risk-free rate for the month
    pub risk_free: f64,
}

impl FactorObservation {
    /// Observation with only the mandatory columns.
    pub const fn market_only(month: Month, market_excess: f64, risk_free: f64) -> Self {
        Self {
            month,
            market_excess,
            size: None,
            value: None,
            profitability: None,
            investment: None,
            risk_free,
        }
    }

    /// Value of a named factor, `None` when the column is absent.
    pub const fn get(&self, factor: FactorName) -> Option<f64> {
        match factor {
            FactorName::Market => Some(self.market_excess),
            FactorName::Size => self.size,
            FactorName::Value => self.value,
            FactorName::Profitability => self.profitability,
            FactorName::Investment => self.investment,
        }
    }

    /// Values of `factors` in order, `None` if any is missing.
    pub fn regressors(&self, factors: &[FactorName]) -> Option<Vec<f64>> {
        factors.iter().map(|&f| self.get(f)).collect()
    }

    fn scaled(mut self, scale: f64) -> Self {
        self.market_excess *= scale;
        self.risk_free *= scale;
        for v in [
            &mut self.size,
            &mut self.value,
            &mut self.profitability,
            &mut self.investment,
        ]
        .into_iter()
        .flatten()
        {
            *v *= scale;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        let columns = [
            ("mkt_rf", Some(self.market_excess)),
            ("smb", self.size),
            ("hml", self.value),
            ("rmw", self.profitability),
            ("cma", self.investment),
            ("rf", Some(self.risk_free)),
        ];
        for (column, value) in columns {
            if let Some(value) = value
                && !value.is_finite()
            {
                return Err(DataError::InvalidFactor {
                    month: self.month.to_string(),
                    column,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Units of an externally supplied factor file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorUnits {
    /// Values are already decimal returns (0.01 = 1%)
    #[default]
    Decimal,
    /// Values are percentages (1.0 = 1%), as in the Kenneth French library
    Percent,
}

impl FactorUnits {
    /// Multiplier converting to decimal returns.
    pub const fn scale(&self) -> f64 {
        match self {
            Self::Decimal => 1.0,
            Self::Percent => 0.01,
        }
    }
}

/// Immutable monthly factor table.
#[derive(Debug, Clone, Default)]
pub struct FactorTable {
    rows: BTreeMap<Month, FactorObservation>,
}

impl FactorTable {
    /// Build a table from decimal-unit observations.
    pub fn new(observations: impl IntoIterator<Item = FactorObservation>) -> Result<Self> {
        Self::with_units(observations, FactorUnits::Decimal)
    }

    /// Build a table, converting from `units` to decimal returns.
    pub fn with_units(
        observations: impl IntoIterator<Item = FactorObservation>,
        units: FactorUnits,
    ) -> Result<Self> {
        let mut rows = BTreeMap::new();
        for obs in observations {
            obs.validate()?;
            let obs = obs.scaled(units.scale());
            let month = obs.month;
            if rows.insert(month, obs).is_some() {
                return Err(DataError::DuplicateMonth(month.to_string()));
            }
        }
        Ok(Self { rows })
    }

    /// Number of months.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Observation for one month.
    pub fn get(&self, month: &Month) -> Option<&FactorObservation> {
        self.rows.get(month)
    }

    /// Observations in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &FactorObservation> {
        self.rows.values()
    }

    /// First and last month covered.
    pub fn span(&self) -> Option<(Month, Month)> {
        let first = self.rows.keys().next()?;
        let last = self.rows.keys().next_back()?;
        Some((*first, *last))
    }

    /// Whether every month carries a value for `factor`.
    pub fn has_factor(&self, factor: FactorName) -> bool {
        !self.rows.is_empty() && self.rows.values().all(|o| o.get(factor).is_some())
    }
}
