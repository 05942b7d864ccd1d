//! Point-in-time investable universe.
//!
//! Membership reconstruction happens outside this workspace; the engine only
//! consumes the resulting month → eligible-instrument mapping.

use crate::month::Month;
use std::collections::{BTreeMap, BTreeSet};

/// Trait for investable universes.
pub trait Universe: Send + Sync {
    /// Whether `symbol` was eligible at formation month `month`.
    fn is_eligible(&self, month: Month, symbol: &str) -> bool;

    /// Number of eligible instruments in `month`, if known.
    fn size(&self, month: Month) -> Option<usize>;
}

/// Universe without membership restrictions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenUniverse;

impl Universe for OpenUniverse {
    fn is_eligible(&self, _month: Month, _symbol: &str) -> bool {
        true
    }

    fn size(&self, _month: Month) -> Option<usize> {
        None
    }
}

/// Month → eligible instruments, as known at that month.
///
/// A month missing from the mapping has no eligible instruments.
#[derive(Debug, Clone, Default)]
pub struct PointInTimeUniverse {
    members: BTreeMap<Month, BTreeSet<String>>,
}

impl PointInTimeUniverse {
    /// Create an empty universe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(month, symbol)` pairs.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (Month, S)>) -> Self {
        let mut universe = Self::new();
        for (month, symbol) in pairs {
            universe.insert(month, symbol);
        }
        universe
    }

    /// Mark `symbol` eligible in `month`.
    pub fn insert(&mut self, month: Month, symbol: impl Into<String>) {
        self.members.entry(month).or_default().insert(symbol.into());
    }

    /// Eligible set for a month.
    pub fn members(&self, month: Month) -> Option<&BTreeSet<String>> {
        self.members.get(&month)
    }

    /// Months covered by the mapping.
    pub fn months(&self) -> impl Iterator<Item = Month> + '_ {
        self.members.keys().copied()
    }
}

impl Universe for PointInTimeUniverse {
    fn is_eligible(&self, month: Month, symbol: &str) -> bool {
        self.members
            .get(&month)
            .is_some_and(|set| set.contains(symbol))
    }

    fn size(&self, month: Month) -> Option<usize> {
        Some(self.members.get(&month).map_or(0, BTreeSet::len))
    }
}
