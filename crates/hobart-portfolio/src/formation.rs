//! Monthly N-tile ranking.
//!
//! Bucket assignment uses `bucket = ceil(rank / n * N)` with 1-based ranks,
//! evaluated in integer arithmetic. When `N` does not divide `n` the rule
//! leaves buckets of unequal size (for example 6 instruments in 5 buckets
//! gives sizes 1, 1, 1, 1, 2); that asymmetry is part of the method and is
//! kept as is.

use crate::config::FormationConfig;
use crate::error::PortfolioError;
use hobart_data::{Month, Universe};
use hobart_signals::VolatilityPoint;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// Bucket membership of one instrument for one holding month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAssignment {
    /// Instrument identifier
    pub symbol: String,
    /// Month whose volatility produced the ranking
    pub formation_month: Month,
    /// Month in which the position is held (formation + lag)
    pub investment_month: Month,
    /// Bucket 1..=N, 1 = lowest volatility
    pub bucket: usize,
    /// Volatility used for ranking
    pub volatility: f64,
}

/// Summary of one ranked month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationMonth {
    /// Formation month
    pub month: Month,
    /// Instruments ranked
    pub instruments: usize,
    /// Instruments the universe lists for the month, when it knows
    pub eligible: Option<usize>,
    /// Instruments per bucket, index 0 = bucket 1
    pub bucket_sizes: Vec<usize>,
}

/// Output of a formation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Formation {
    /// Assignments ordered by formation month, then bucket, then rank
    pub assignments: Vec<PortfolioAssignment>,
    /// Ranked months in chronological order
    pub months: Vec<FormationMonth>,
    /// Months with candidates that were not ranked (too few instruments)
    pub skipped_months: Vec<(Month, usize)>,
    /// Instrument threshold that was applied
    pub min_instruments: usize,
    /// Whether the lenient fallback threshold was used
    pub lenient: bool,
}

/// Bucket of a 1-based `rank` among `n` instruments split into `buckets`.
///
/// Equals `ceil(rank / n * buckets)`; exact for all inputs.
pub const fn bucket_for_rank(rank: usize, n: usize, buckets: usize) -> usize {
    (rank * buckets).div_ceil(n)
}

/// N-tile formation engine
#[derive(Debug, Clone)]
pub struct NtileFormation {
    config: FormationConfig,
}

struct Candidate<'a> {
    order: usize,
    symbol: &'a str,
    date: chrono::NaiveDate,
    volatility: f64,
}

impl NtileFormation {
    /// Create an engine, rejecting invalid configurations up front.
    pub fn new(config: FormationConfig) -> Result<Self, PortfolioError> {
        config.validate()?;
        if config.lag == 0 {
            warn!("formation lag is zero: rankings are invested in the month they are observed");
        }
        Ok(Self { config })
    }

    /// Engine configuration.
    pub const fn config(&self) -> &FormationConfig {
        &self.config
    }

    /// Rank every month covered by `points`.
    ///
    /// Each instrument contributes its latest point dated inside the month,
    /// provided `universe` lists it as eligible for that month. Ties in
    /// volatility keep the order in which instruments first appear in
    /// `points`.
    pub fn form(
        &self,
        points: &[VolatilityPoint],
        universe: &dyn Universe,
    ) -> Result<Formation, PortfolioError> {
        let cross_sections = self.cross_sections(points, universe);
        if cross_sections.is_empty() {
            return Err(PortfolioError::InsufficientData(
                "no eligible volatility estimates".to_string(),
            ));
        }

        let strict = self.config.min_instruments;
        let qualifies = |threshold: usize| {
            cross_sections
                .values()
                .any(|candidates| candidates.len() >= threshold)
        };

        let (threshold, lenient) = if qualifies(strict) {
            (strict, false)
        } else {
            let lenient = self.config.lenient_threshold();
            warn!(
                strict,
                lenient, "no month reaches the instrument minimum, using lenient threshold"
            );
            if !qualifies(lenient) {
                return Err(PortfolioError::InsufficientData(format!(
                    "no month has at least {lenient} eligible instruments"
                )));
            }
            (lenient, true)
        };

        let mut formation = Formation {
            min_instruments: threshold,
            lenient,
            ..Default::default()
        };

        for (month, mut candidates) in cross_sections {
            let eligible = universe.size(month);
            if candidates.len() < threshold {
                debug!(
                    %month,
                    instruments = candidates.len(),
                    eligible = ?eligible,
                    threshold,
                    "skipping thin month"
                );
                formation.skipped_months.push((month, candidates.len()));
                continue;
            }

            candidates.sort_by_key(|c| c.order);
            candidates.sort_by(|a, b| a.volatility.total_cmp(&b.volatility));

            let n = candidates.len();
            let mut bucket_sizes = vec![0usize; self.config.buckets];
            let investment_month = month.add_months(self.config.lag);

            for (idx, candidate) in candidates.iter().enumerate() {
                let bucket = bucket_for_rank(idx + 1, n, self.config.buckets);
                bucket_sizes[bucket - 1] += 1;
                formation.assignments.push(PortfolioAssignment {
                    symbol: candidate.symbol.to_string(),
                    formation_month: month,
                    investment_month,
                    bucket,
                    volatility: candidate.volatility,
                });
            }

            formation.months.push(FormationMonth {
                month,
                instruments: n,
                eligible,
                bucket_sizes,
            });
        }

        info!(
            months = formation.months.len(),
            skipped = formation.skipped_months.len(),
            assignments = formation.assignments.len(),
            buckets = self.config.buckets,
            lag = self.config.lag,
            "formed volatility portfolios"
        );
        Ok(formation)
    }

    fn cross_sections<'a>(
        &self,
        points: &'a [VolatilityPoint],
        universe: &dyn Universe,
    ) -> BTreeMap<Month, Vec<Candidate<'a>>> {
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut latest: BTreeMap<Month, HashMap<&str, Candidate<'a>>> = BTreeMap::new();

        for point in points {
            let next = first_seen.len();
            let order = *first_seen.entry(point.symbol.as_str()).or_insert(next);
            let month = Month::from_date(point.date);

            if !point.volatility.is_finite() || !universe.is_eligible(month, &point.symbol) {
                continue;
            }

            let slot = latest.entry(month).or_default();
            let replace = slot
                .get(point.symbol.as_str())
                .is_none_or(|existing| point.date >= existing.date);
            if replace {
                slot.insert(
                    point.symbol.as_str(),
                    Candidate {
                        order,
                        symbol: point.symbol.as_str(),
                        date: point.date,
                        volatility: point.volatility,
                    },
                );
            }
        }

        latest
            .into_iter()
            .map(|(month, by_symbol)| (month, by_symbol.into_values().collect()))
            .collect()
    }
}

impl Default for NtileFormation {
    fn default() -> Self {
        Self {
            config: FormationConfig::default(),
        }
    }
}
