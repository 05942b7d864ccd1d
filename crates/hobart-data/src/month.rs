//! Calendar month arithmetic.
//!
//! Portfolio formation and factor alignment both work at monthly granularity,
//! so every date in the pipeline is eventually reduced to a [`Month`].

use crate::error::{DataError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// Create a month, returning `None` when `month` is outside 1..=12.
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Month of year (1..=12).
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Months elapsed since year 0, January.
    const fn ordinal(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    const fn from_ordinal(ordinal: i64) -> Self {
        Self {
            year: ordinal.div_euclid(12) as i32,
            month: (ordinal.rem_euclid(12) + 1) as u32,
        }
    }

    /// Shift by a signed number of months.
    pub const fn add_months(&self, months: i32) -> Self {
        Self::from_ordinal(self.ordinal() + months as i64)
    }

    /// The following month.
    pub const fn succ(&self) -> Self {
        self.add_months(1)
    }

    /// The preceding month.
    pub const fn pred(&self) -> Self {
        self.add_months(-1)
    }

    /// Signed number of months from `other` to `self`.
    pub const fn months_since(&self, other: &Self) -> i64 {
        self.ordinal() - other.ordinal()
    }

    /// First calendar day of the month.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Whether `date` falls inside this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Parse `YYYY-MM`, `YYYYMM` or a full `YYYY-MM-DD` date.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || DataError::Parse(format!("Invalid month: {s:?}"));

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::from_date(date));
        }

        let (year, month) = if let Some((y, m)) = s.split_once('-') {
            (y, m)
        } else if s.len() == 6 && s.chars().all(|c| c.is_ascii_digit()) {
            s.split_at(4)
        } else {
            return Err(invalid());
        };

        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Month {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}
