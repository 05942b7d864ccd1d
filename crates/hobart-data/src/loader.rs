//! CSV readers for the three external inputs.
//!
//! Expected layouts:
//! - prices: `symbol,date,adj_close` (`adjusted_close` and `price` accepted)
//! - factors: `month,mkt_rf,smb,hml,rmw,cma,rf` (Fama-French headers such as
//!   `Mkt-RF` are accepted; optional columns may be absent or empty)
//! - membership: `month,symbol`

use crate::error::{DataError, Result};
use crate::factors::{FactorObservation, FactorTable, FactorUnits};
use crate::month::Month;
use crate::prices::{PriceObservation, PriceTable};
use crate::universe::PointInTimeUniverse;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(alias = "ticker", alias = "permno")]
    symbol: String,
    date: NaiveDate,
    #[serde(alias = "adjusted_close", alias = "price")]
    adj_close: f64,
}

#[derive(Debug, Deserialize)]
struct FactorRow {
    #[serde(alias = "date", alias = "Date")]
    month: String,
    #[serde(alias = "Mkt-RF", alias = "mkt_excess")]
    mkt_rf: f64,
    #[serde(default, alias = "SMB")]
    smb: Option<f64>,
    #[serde(default, alias = "HML")]
    hml: Option<f64>,
    #[serde(default, alias = "RMW")]
    rmw: Option<f64>,
    #[serde(default, alias = "CMA")]
    cma: Option<f64>,
    #[serde(alias = "RF")]
    rf: f64,
}

#[derive(Debug, Deserialize)]
struct MembershipRow {
    #[serde(alias = "date")]
    month: String,
    #[serde(alias = "ticker")]
    symbol: String,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader)
}

/// Read a price table from CSV.
pub fn read_prices<R: Read>(reader: R) -> Result<PriceTable> {
    let mut rdr = csv_reader(reader);
    let observations = rdr
        .deserialize::<PriceRow>()
        .map(|row| row.map(|r| PriceObservation::new(r.symbol, r.date, r.adj_close)))
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    debug!(rows = observations.len(), "read price rows");
    PriceTable::new(observations)
}

/// Read a factor table from CSV, converting from `units`.
pub fn read_factors<R: Read>(reader: R, units: FactorUnits) -> Result<FactorTable> {
    let mut rdr = csv_reader(reader);
    let mut observations = Vec::new();
    for row in rdr.deserialize::<FactorRow>() {
        let row = row?;
        observations.push(FactorObservation {
            month: Month::parse(&row.month)?,
            market_excess: row.mkt_rf,
            size: row.smb,
            value: row.hml,
            profitability: row.rmw,
            investment: row.cma,
            risk_free: row.rf,
        });
    }
    debug!(rows = observations.len(), ?units, "read factor rows");
    FactorTable::with_units(observations, units)
}

/// Read a point-in-time membership mapping from CSV.
pub fn read_membership<R: Read>(reader: R) -> Result<PointInTimeUniverse> {
    let mut rdr = csv_reader(reader);
    let mut universe = PointInTimeUniverse::new();
    for row in rdr.deserialize::<MembershipRow>() {
        let row = row?;
        universe.insert(Month::parse(&row.month)?, row.symbol);
    }
    Ok(universe)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        DataError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })
}

/// Read a price table from a CSV file.
pub fn read_prices_path<P: AsRef<Path>>(path: P) -> Result<PriceTable> {
    read_prices(open(path.as_ref())?)
}

/// Read a factor table from a CSV file.
pub fn read_factors_path<P: AsRef<Path>>(path: P, units: FactorUnits) -> Result<FactorTable> {
    read_factors(open(path.as_ref())?, units)
}

/// Read a membership mapping from a CSV file.
pub fn read_membership_path<P: AsRef<Path>>(path: P) -> Result<PointInTimeUniverse> {
    read_membership(open(path.as_ref())?)
}
