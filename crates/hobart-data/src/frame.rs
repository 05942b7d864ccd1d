//! Polars `DataFrame` adapters for callers that already hold tabular data.

use crate::error::{DataError, Result};
use crate::prices::{PriceObservation, PriceTable};
use chrono::NaiveDate;
use polars::prelude::*;

impl PriceTable {
    /// Build from a frame with `symbol`, `date` and `adj_close` columns.
    ///
    /// `date` may be a `Date` column or `YYYY-MM-DD` strings.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let symbols = df.column("symbol")?.str()?;
        let dates = df.column("date")?.cast(&DataType::String)?;
        let dates = dates.str()?;
        let prices = df.column("adj_close")?.cast(&DataType::Float64)?;
        let prices = prices.f64()?;

        let mut observations = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let symbol = symbols
                .get(i)
                .ok_or_else(|| DataError::Parse(format!("Missing symbol in row {i}")))?;
            let date = dates
                .get(i)
                .ok_or_else(|| DataError::Parse(format!("Missing date in row {i}")))?;
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| DataError::Parse(format!("Invalid date {date:?}: {e}")))?;
            let price = prices
                .get(i)
                .ok_or_else(|| DataError::Parse(format!("Missing adj_close in row {i}")))?;
            observations.push(PriceObservation::new(symbol, date, price));
        }

        Self::new(observations)
    }

    /// Convert to a frame with `symbol`, `date` (as `Date`) and `adj_close`.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let mut symbols = Vec::with_capacity(self.observation_count());
        let mut dates = Vec::with_capacity(self.observation_count());
        let mut prices = Vec::with_capacity(self.observation_count());

        for obs in self.observations() {
            symbols.push(obs.symbol);
            dates.push(obs.date.format("%Y-%m-%d").to_string());
            prices.push(obs.price);
        }

        let df = DataFrame::new(vec![
            Series::new("symbol".into(), symbols).into(),
            Series::new("date".into(), dates).into(),
            Series::new("adj_close".into(), prices).into(),
        ])?;

        let df = df
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()?;

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip() {
        let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
        let table = PriceTable::new(vec![
            PriceObservation::new("AAA", d(2), 10.0),
            PriceObservation::new("AAA", d(3), 11.0),
            PriceObservation::new("BBB", d(2), 5.0),
        ])
        .unwrap();

        let df = table.to_frame().unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let back = PriceTable::from_frame(&df).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.get("AAA").unwrap()[1].price, 11.0);
        assert_eq!(back.get("BBB").unwrap()[0].date, d(2));
    }

    #[test]
    fn test_from_frame_with_string_dates() {
        let df = DataFrame::new(vec![
            Series::new("symbol".into(), vec!["AAA", "AAA"]).into(),
            Series::new("date".into(), vec!["2020-01-03", "2020-01-02"]).into(),
            Series::new("adj_close".into(), vec![2.0, 1.0]).into(),
        ])
        .unwrap();

        let table = PriceTable::from_frame(&df).unwrap();
        let series = table.get("AAA").unwrap();
        assert_eq!(series[0].price, 1.0);
    }

    #[test]
    fn test_from_frame_missing_column() {
        let df = DataFrame::new(vec![Series::new("symbol".into(), vec!["AAA"]).into()]).unwrap();
        assert!(matches!(
            PriceTable::from_frame(&df),
            Err(DataError::Polars(_))
        ));
    }
}
