//! Rolling Historical Volatility
//!
//! Measures realized volatility of screened log returns over a trailing window.
//! An estimate is emitted only when the window holds enough valid returns, so
//! illiquid or short-lived instruments simply produce nothing.

use super::returns::{ReturnObservation, ReturnSeries, log_returns};
use super::{Sampling, TRADING_DAYS_PER_YEAR, VolatilityConfig};
use crate::SignalError;
use chrono::NaiveDate;
use hobart_data::{DatedPrice, Month, PriceTable};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Annualized trailing volatility of one instrument as of one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityPoint {
    /// Instrument identifier
    pub symbol: String,
    /// Date of the last return in the window
    pub date: NaiveDate,
    /// Annualized standard deviation of valid returns
    pub volatility: f64,
}

/// Rolling volatility estimator
#[derive(Debug, Clone)]
pub struct RollingVolatility {
    config: VolatilityConfig,
}

impl RollingVolatility {
    /// Create an estimator, rejecting invalid configurations up front.
    pub fn new(config: VolatilityConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Estimator configuration.
    pub const fn config(&self) -> &VolatilityConfig {
        &self.config
    }

    /// Estimate every instrument in the table.
    ///
    /// Returns are screened per instrument in parallel, then a single rolling
    /// pass runs over all instruments. The output is ordered by symbol then
    /// date.
    pub fn estimate(&self, prices: &PriceTable) -> Result<Vec<VolatilityPoint>, SignalError> {
        let instruments: Vec<(&str, &[DatedPrice])> = prices.iter().collect();

        let screened: Vec<(&str, ReturnSeries)> = instruments
            .par_iter()
            .filter_map(|(symbol, history)| self.screen(symbol, history).map(|r| (*symbol, r)))
            .collect();
        let points = self.rolling(&screened)?;

        info!(
            instruments = prices.len(),
            screened = screened.len(),
            points = points.len(),
            window = self.config.window,
            "estimated rolling volatility"
        );
        Ok(points)
    }

    /// Estimate one instrument from its chronologically ordered prices.
    pub fn estimate_instrument(
        &self,
        symbol: &str,
        prices: &[DatedPrice],
    ) -> Result<Vec<VolatilityPoint>, SignalError> {
        let Some(returns) = self.screen(symbol, prices) else {
            return Ok(Vec::new());
        };
        let valid = returns.valid_count();
        let points = self.rolling(&[(symbol, returns)])?;
        if points.is_empty() {
            debug!(symbol, valid, "no window met the coverage requirement");
        }
        Ok(points)
    }

    fn screen(&self, symbol: &str, prices: &[DatedPrice]) -> Option<ReturnSeries> {
        if prices.len() < self.config.min_history() {
            debug!(
                symbol,
                observations = prices.len(),
                required = self.config.min_history(),
                "skipping instrument with short history"
            );
            return None;
        }
        Some(log_returns(prices, &self.config))
    }

    /// Trailing sample std of valid returns over `window` rows per symbol.
    ///
    /// Screened returns are null, so `min_periods` counts valid returns only.
    /// Rows before the first full window are dropped.
    fn rolling(
        &self,
        instruments: &[(&str, ReturnSeries)],
    ) -> Result<Vec<VolatilityPoint>, SignalError> {
        let window = self.config.window;
        let rows: Vec<(&str, NaiveDate)> = instruments
            .iter()
            .flat_map(|(symbol, series)| series.observations().iter().map(move |r| (*symbol, r.date)))
            .collect();
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let frame = self
            .returns_frame(instruments, rows.len())?
            .lazy()
            .sort(["symbol", "row"], Default::default())
            .with_columns([col("returns")
                .rolling_std(RollingOptionsFixedWindow {
                    window_size: window,
                    min_periods: self.config.min_valid(),
                    ..Default::default()
                })
                .over([col("symbol")])
                .alias("volatility")])
            .filter(
                col("position")
                    .gt_eq(lit((window - 1) as u32))
                    .and(col("emit"))
                    .and(col("volatility").is_not_null()),
            )
            .with_columns([
                (col("volatility") * lit(TRADING_DAYS_PER_YEAR.sqrt())).alias("volatility")
            ])
            .select([col("row"), col("volatility")])
            .collect()?;

        let row_ids = frame.column("row")?.u32()?;
        let volatility = frame.column("volatility")?.f64()?;
        let points = row_ids
            .into_iter()
            .zip(volatility)
            .filter_map(|(row, vol)| {
                let (symbol, date) = rows.get(row? as usize)?;
                Some(VolatilityPoint {
                    symbol: symbol.to_string(),
                    date: *date,
                    volatility: vol?,
                })
            })
            .collect();
        Ok(points)
    }

    /// One row per return: `symbol`, global `row` id, `position` within the
    /// instrument, `emit` flag from the sampling schedule and nullable `returns`.
    fn returns_frame(
        &self,
        instruments: &[(&str, ReturnSeries)],
        capacity: usize,
    ) -> Result<DataFrame, SignalError> {
        let mut symbols = Vec::with_capacity(capacity);
        let mut row_ids = Vec::with_capacity(capacity);
        let mut positions = Vec::with_capacity(capacity);
        let mut emits = Vec::with_capacity(capacity);
        let mut returns = Vec::with_capacity(capacity);

        for (symbol, series) in instruments {
            let obs = series.observations();
            for (i, r) in obs.iter().enumerate() {
                symbols.push(*symbol);
                row_ids.push(row_ids.len() as u32);
                positions.push(i as u32);
                emits.push(self.emits_on(obs, i));
                returns.push(r.valid.then_some(r.value));
            }
        }

        Ok(DataFrame::new(vec![
            Series::new("symbol".into(), symbols).into(),
            Series::new("row".into(), row_ids).into(),
            Series::new("position".into(), positions).into(),
            Series::new("emit".into(), emits).into(),
            Series::new("returns".into(), returns).into(),
        ])?)
    }

    fn emits_on(&self, obs: &[ReturnObservation], idx: usize) -> bool {
        match self.config.sampling {
            Sampling::Daily => true,
            Sampling::MonthEnd => obs
                .get(idx + 1)
                .is_none_or(|next| Month::from_date(next.date) != Month::from_date(obs[idx].date)),
        }
    }
}

impl Default for RollingVolatility {
    fn default() -> Self {
        Self {
            config: VolatilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_std(values: &[f64]) -> f64 {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (values.len() - 1) as f64).sqrt()
    }

    fn history(prices: &[f64]) -> Vec<DatedPrice> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| DatedPrice {
                date: start + chrono::Duration::days(i as i64),
                price,
            })
            .collect()
    }

    fn small_config() -> VolatilityConfig {
        VolatilityConfig {
            window: 4,
            min_coverage: 0.75,
            min_price: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_estimator() {
        let estimator = RollingVolatility::default();
        assert_eq!(estimator.config().window, 252);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = VolatilityConfig {
            window: 0,
            ..Default::default()
        };
        assert!(RollingVolatility::new(config).is_err());
    }

    #[test]
    fn test_known_volatility() {
        let estimator = RollingVolatility::new(small_config()).unwrap();
        let prices = [100.0, 101.0, 99.0, 100.5, 102.0, 101.0];
        let points = estimator.estimate_instrument("AAA", &history(&prices)).unwrap();

        // 5 returns, window 4 -> 2 points
        assert_eq!(points.len(), 2);

        let r: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        let expected = sample_std(&r[0..4]) * 252.0_f64.sqrt();
        assert_relative_eq!(points[0].volatility, expected, max_relative = 1e-9);
        assert_eq!(points[0].date, history(&prices)[4].date);
        assert_eq!(points[1].date, history(&prices)[5].date);
    }

    #[test]
    fn test_short_history_emits_nothing() {
        let estimator = RollingVolatility::new(small_config()).unwrap();
        let points = estimator
            .estimate_instrument("AAA", &history(&[1.0, 1.1, 1.2, 1.3]))
            .unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_coverage_requirement() {
        let estimator = RollingVolatility::new(small_config()).unwrap();
        // Two extreme jumps inside every 4-return window leave only 2 valid < 3.
        let prices = [10.0, 10.1, 50.0, 10.0, 10.2, 10.1];
        let points = estimator.estimate_instrument("AAA", &history(&prices)).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_invalid_returns_excluded_from_estimate() {
        let config = VolatilityConfig {
            window: 5,
            min_coverage: 0.6,
            min_price: 0.0,
            ..Default::default()
        };
        let estimator = RollingVolatility::new(config).unwrap();
        let prices = [10.0, 10.2, 50.0, 10.1, 10.3, 10.0];
        let points = estimator.estimate_instrument("AAA", &history(&prices)).unwrap();
        assert_eq!(points.len(), 1);

        let valid = [(10.2_f64 / 10.0).ln(), (10.3_f64 / 10.1).ln(), (10.0_f64 / 10.3).ln()];
        let expected = sample_std(&valid) * 252.0_f64.sqrt();
        assert_relative_eq!(points[0].volatility, expected, max_relative = 1e-9);
    }

    #[test]
    fn test_month_end_sampling() {
        let config = VolatilityConfig {
            sampling: Sampling::MonthEnd,
            ..small_config()
        };
        let estimator = RollingVolatility::new(config).unwrap();
        // 40 daily prices starting 2020-01-01 span January and part of February.
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i % 3) as f64).collect();
        let points = estimator.estimate_instrument("AAA", &history(&prices)).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2020, 1, 31).unwrap());
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2020, 2, 9).unwrap());
    }

    #[test]
    fn test_estimate_orders_by_symbol() {
        let estimator = RollingVolatility::new(small_config()).unwrap();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut observations = Vec::new();
        for symbol in ["CCC", "AAA", "BBB"] {
            for i in 0..6 {
                observations.push(hobart_data::PriceObservation::new(
                    symbol,
                    start + chrono::Duration::days(i),
                    100.0 + (i * i) as f64,
                ));
            }
        }
        let table = PriceTable::new(observations).unwrap();
        let points = estimator.estimate(&table).unwrap();
        let symbols: Vec<&str> = points.iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAA", "AAA", "BBB", "BBB", "CCC", "CCC"]);
    }
}
