//! Realized portfolio returns.

use crate::error::PortfolioError;
use crate::formation::PortfolioAssignment;
use derive_more::Display;
use hobart_data::{Month, PriceTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Month-end to month-end simple returns per instrument.
#[derive(Debug, Clone, Default)]
pub struct MonthlyReturns {
    by_symbol: BTreeMap<String, BTreeMap<Month, f64>>,
}

impl MonthlyReturns {
    /// Derive monthly returns from daily prices.
    ///
    /// The return for month M is `P_end(M) / P_end(M-1) - 1` and exists only
    /// when both months have a price.
    pub fn from_prices(prices: &PriceTable) -> Self {
        let by_symbol = prices
            .symbols()
            .map(|symbol| {
                let ends = prices.month_end_prices(symbol);
                let returns = ends
                    .windows(2)
                    .filter(|w| w[1].0 == w[0].0.succ())
                    .map(|w| (w[1].0, w[1].1 / w[0].1 - 1.0))
                    .collect();
                (symbol.to_string(), returns)
            })
            .collect();
        Self { by_symbol }
    }

    /// Build directly from `(symbol, month, return)` triples.
    pub fn from_triples<S: Into<String>>(triples: impl IntoIterator<Item = (S, Month, f64)>) -> Self {
        let mut by_symbol: BTreeMap<String, BTreeMap<Month, f64>> = BTreeMap::new();
        for (symbol, month, value) in triples {
            by_symbol.entry(symbol.into()).or_default().insert(month, value);
        }
        Self { by_symbol }
    }

    /// Return of `symbol` in `month`.
    pub fn get(&self, symbol: &str, month: Month) -> Option<f64> {
        self.by_symbol.get(symbol)?.get(&month).copied()
    }

    /// Number of instruments with at least one return.
    pub fn len(&self) -> usize {
        self.by_symbol.values().filter(|m| !m.is_empty()).count()
    }

    /// Whether no instrument has a return.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identifier of a ranked portfolio, serialized as its label (`P1`, `LS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PortfolioId {
    /// Volatility bucket (1 = lowest)
    #[display("P{_0}")]
    Bucket(usize),
    /// Bucket 1 minus bucket N
    #[display("LS")]
    LongShort,
}

impl FromStr for PortfolioId {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "LS" {
            return Ok(Self::LongShort);
        }
        s.strip_prefix('P')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .map(Self::Bucket)
            .ok_or_else(|| PortfolioError::InvalidConfiguration(format!("unknown portfolio {s:?}")))
    }
}

impl TryFrom<String> for PortfolioId {
    type Error = PortfolioError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PortfolioId> for String {
    fn from(id: PortfolioId) -> Self {
        id.to_string()
    }
}

/// Equal-weighted return of one portfolio in one investment month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReturn {
    /// Portfolio
    pub portfolio: PortfolioId,
    /// Holding month
    pub month: Month,
    /// Equal-weighted mean return
    pub value: f64,
    /// Constituents with a realized return
    pub constituents: usize,
}

/// All portfolio return series of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioSet {
    buckets: usize,
    series: BTreeMap<PortfolioId, Vec<PortfolioReturn>>,
}

impl PortfolioSet {
    /// Number of volatility buckets.
    pub const fn buckets(&self) -> usize {
        self.buckets
    }

    /// Return series of one portfolio, ordered by month.
    pub fn get(&self, id: PortfolioId) -> Option<&[PortfolioReturn]> {
        self.series.get(&id).map(Vec::as_slice)
    }

    /// Portfolios with at least one return, buckets first.
    pub fn ids(&self) -> impl Iterator<Item = PortfolioId> + '_ {
        self.series.keys().copied()
    }

    /// Bucket series only (excludes the long-short spread).
    pub fn bucket_series(&self) -> impl Iterator<Item = (PortfolioId, &[PortfolioReturn])> {
        self.series
            .iter()
            .filter(|(id, _)| matches!(id, PortfolioId::Bucket(_)))
            .map(|(id, s)| (*id, s.as_slice()))
    }

    /// Long-short spread series.
    pub fn long_short(&self) -> Option<&[PortfolioReturn]> {
        self.get(PortfolioId::LongShort)
    }

    /// Every return of every portfolio.
    pub fn iter(&self) -> impl Iterator<Item = &PortfolioReturn> {
        self.series.values().flatten()
    }
}

/// Equal-weighted bucket returns for each investment month.
///
/// Constituents without a realized return that month are left out; a
/// bucket-month with no realized returns is absent rather than zero.
pub fn portfolio_returns(
    assignments: &[PortfolioAssignment],
    returns: &MonthlyReturns,
    buckets: usize,
) -> PortfolioSet {
    let mut sums: BTreeMap<(usize, Month), (f64, usize)> = BTreeMap::new();
    let mut missing = 0usize;

    for a in assignments {
        match returns.get(&a.symbol, a.investment_month) {
            Some(r) => {
                let entry = sums.entry((a.bucket, a.investment_month)).or_insert((0.0, 0));
                entry.0 += r;
                entry.1 += 1;
            }
            None => missing += 1,
        }
    }
    if missing > 0 {
        debug!(missing, "assignments without a realized return in their holding month");
    }

    let mut series: BTreeMap<PortfolioId, Vec<PortfolioReturn>> = BTreeMap::new();
    for ((bucket, month), (sum, count)) in sums {
        let id = PortfolioId::Bucket(bucket);
        series.entry(id).or_default().push(PortfolioReturn {
            portfolio: id,
            month,
            value: sum / count as f64,
            constituents: count,
        });
    }

    let spread = match (
        series.get(&PortfolioId::Bucket(1)),
        series.get(&PortfolioId::Bucket(buckets)),
    ) {
        (Some(low), Some(high)) => long_short(low, high),
        _ => Vec::new(),
    };
    if !spread.is_empty() {
        series.insert(PortfolioId::LongShort, spread);
    }

    PortfolioSet { buckets, series }
}

/// Low-minus-high spread over months where both legs exist.
pub fn long_short(low: &[PortfolioReturn], high: &[PortfolioReturn]) -> Vec<PortfolioReturn> {
    let high: BTreeMap<Month, &PortfolioReturn> = high.iter().map(|r| (r.month, r)).collect();
    low.iter()
        .filter_map(|l| {
            high.get(&l.month).map(|h| PortfolioReturn {
                portfolio: PortfolioId::LongShort,
                month: l.month,
                value: l.value - h.value,
                constituents: l.constituents + h.constituents,
            })
        })
        .collect()
}
