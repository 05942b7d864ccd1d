//! Adjusted price observations.

use crate::error::{DataError, Result};
use crate::month::Month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single adjusted closing price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Instrument identifier
    pub symbol: String,
    /// Trading date
    pub date: NaiveDate,
    /// Split- and dividend-adjusted price (strictly positive)
    pub price: f64,
}

impl PriceObservation {
    /// Create a new price observation.
    pub fn new(symbol: impl Into<String>, date: NaiveDate, price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            price,
        }
    }
}

/// A dated price without its instrument key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatedPrice {
    /// Trading date
    pub date: NaiveDate,
    /// Adjusted price
    pub price: f64,
}

/// Immutable price history keyed by instrument.
///
/// Every series is sorted chronologically and contains only strictly positive,
/// finite prices. Instruments iterate in key order.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    series: BTreeMap<String, Vec<DatedPrice>>,
}

impl PriceTable {
    /// Build a table from unordered observations.
    ///
    /// Fails on a non-positive/non-finite price or a repeated instrument/date.
    pub fn new(observations: impl IntoIterator<Item = PriceObservation>) -> Result<Self> {
        let mut series: BTreeMap<String, Vec<DatedPrice>> = BTreeMap::new();

        for obs in observations {
            if !obs.price.is_finite() || obs.price <= 0.0 {
                return Err(DataError::InvalidPrice {
                    symbol: obs.symbol,
                    date: obs.date,
                    price: obs.price,
                });
            }
            series.entry(obs.symbol).or_default().push(DatedPrice {
                date: obs.date,
                price: obs.price,
            });
        }

        for (symbol, prices) in &mut series {
            prices.sort_by_key(|p| p.date);
            if let Some(pair) = prices.windows(2).find(|w| w[0].date == w[1].date) {
                return Err(DataError::DuplicateObservation {
                    symbol: symbol.clone(),
                    date: pair[0].date,
                });
            }
        }

        Ok(Self { series })
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the table holds no instruments.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Total number of observations across instruments.
    pub fn observation_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    /// Price history of one instrument.
    pub fn get(&self, symbol: &str) -> Option<&[DatedPrice]> {
        self.series.get(symbol).map(Vec::as_slice)
    }

    /// Instrument identifiers in key order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// `(symbol, history)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DatedPrice])> {
        self.series
            .iter()
            .map(|(symbol, prices)| (symbol.as_str(), prices.as_slice()))
    }

    /// Last observed price in each calendar month for one instrument.
    pub fn month_end_prices(&self, symbol: &str) -> Vec<(Month, f64)> {
        let Some(prices) = self.series.get(symbol) else {
            return Vec::new();
        };

        let mut out: Vec<(Month, f64)> = Vec::new();
        for p in prices {
            let month = Month::from_date(p.date);
            match out.last_mut() {
                Some((last, price)) if *last == month => *price = p.price,
                _ => out.push((month, p.price)),
            }
        }
        out
    }

    /// Flatten back into observations, ordered by instrument then date.
    pub fn observations(&self) -> impl Iterator<Item = PriceObservation> + '_ {
        self.series.iter().flat_map(|(symbol, prices)| {
            prices
                .iter()
                .map(move |p| PriceObservation::new(symbol.clone(), p.date, p.price))
        })
    }
}
