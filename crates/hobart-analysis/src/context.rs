//! Immutable inputs shared by every stage of a run.

use hobart_data::{FactorTable, OpenUniverse, PriceTable, Universe};
use std::fmt;

/// Prices, factors and the eligible universe for one analysis run.
///
/// Built once and only borrowed afterwards, so it can be shared across the
/// rayon pool without synchronization.
pub struct AnalysisContext {
    prices: PriceTable,
    factors: FactorTable,
    universe: Box<dyn Universe>,
}

impl AnalysisContext {
    /// Context in which every instrument is always eligible.
    pub fn new(prices: PriceTable, factors: FactorTable) -> Self {
        Self {
            prices,
            factors,
            universe: Box::new(OpenUniverse),
        }
    }

    /// Restrict ranking to a point-in-time universe.
    pub fn with_universe(mut self, universe: impl Universe + 'static) -> Self {
        self.universe = Box::new(universe);
        self
    }

    /// Daily prices.
    pub const fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Monthly factor returns.
    pub const fn factors(&self) -> &FactorTable {
        &self.factors
    }

    /// Eligible instruments per month.
    pub fn universe(&self) -> &dyn Universe {
        self.universe.as_ref()
    }
}

impl fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("instruments", &self.prices.len())
            .field("price_observations", &self.prices.observation_count())
            .field("factor_months", &self.factors.len())
            .finish_non_exhaustive()
    }
}
