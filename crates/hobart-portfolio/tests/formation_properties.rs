//! Partition, lag and spread properties of the formation engine.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use hobart_data::{Month, OpenUniverse};
use hobart_portfolio::{
    FormationConfig, MonthlyReturns, NtileFormation, PortfolioId, portfolio_returns,
};
use hobart_signals::VolatilityPoint;
use std::collections::{BTreeMap, BTreeSet};

fn month_end(month: Month) -> NaiveDate {
    month.succ().first_day().unwrap().pred_opt().unwrap()
}

fn points_for(month: Month, vols: &[(&str, f64)]) -> Vec<VolatilityPoint> {
    vols.iter()
        .map(|(symbol, vol)| VolatilityPoint {
            symbol: symbol.to_string(),
            date: month_end(month),
            volatility: *vol,
        })
        .collect()
}

#[test]
fn test_partition_is_exhaustive_and_ordered() {
    let start = Month::new(2018, 1).unwrap();
    let mut points = Vec::new();
    for k in 0..12 {
        let month = start.add_months(k);
        // 23 instruments with scrambled but distinct volatilities.
        let vols: Vec<(String, f64)> = (0..23)
            .map(|i| (format!("S{i:02}"), ((i * 7 + k as usize * 3) % 23) as f64 / 10.0 + 0.05))
            .collect();
        let refs: Vec<(&str, f64)> = vols.iter().map(|(s, v)| (s.as_str(), *v)).collect();
        points.extend(points_for(month, &refs));
    }

    let engine = NtileFormation::new(FormationConfig::default()).unwrap();
    let formation = engine.form(&points, &OpenUniverse).unwrap();
    assert_eq!(formation.months.len(), 12);

    let mut by_month: BTreeMap<Month, Vec<_>> = BTreeMap::new();
    for a in &formation.assignments {
        by_month.entry(a.formation_month).or_default().push(a);
    }

    for (month, assignments) in by_month {
        let symbols: BTreeSet<&str> = assignments.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols.len(), 23, "{month}: every instrument exactly once");
        assert_eq!(assignments.len(), 23);

        for bucket in 1..5 {
            let max_low = assignments
                .iter()
                .filter(|a| a.bucket == bucket)
                .map(|a| a.volatility)
                .fold(f64::NEG_INFINITY, f64::max);
            let min_high = assignments
                .iter()
                .filter(|a| a.bucket > bucket)
                .map(|a| a.volatility)
                .fold(f64::INFINITY, f64::min);
            assert!(max_low <= min_high, "{month}: buckets cross at {bucket}");
        }
    }
}

#[test]
fn test_two_instrument_long_short_is_exact() {
    let config = FormationConfig {
        buckets: 2,
        min_instruments: 2,
        lenient_min_instruments: None,
        lag: 1,
    };
    let engine = NtileFormation::new(config).unwrap();
    let start = Month::new(2020, 1).unwrap();
    let (r1, r2) = (0.0125, -0.0340);

    let mut points = Vec::new();
    let mut triples = Vec::new();
    for k in 0..6 {
        let month = start.add_months(k);
        points.extend(points_for(month, &[("LOW", 0.10), ("HIGH", 0.50)]));
        triples.push(("LOW", month.succ(), r1));
        triples.push(("HIGH", month.succ(), r2));
    }

    let formation = engine.form(&points, &OpenUniverse).unwrap();
    let set = portfolio_returns(&formation.assignments, &MonthlyReturns::from_triples(triples), 2);
    let ls = set.long_short().unwrap();
    assert_eq!(ls.len(), 6);
    for r in ls {
        assert_eq!(r.value, r1 - r2);
    }
}

#[test]
fn test_ranking_affects_only_lagged_month() {
    let config = FormationConfig {
        buckets: 2,
        min_instruments: 2,
        lenient_min_instruments: None,
        lag: 1,
    };
    let engine = NtileFormation::new(config).unwrap();
    let formation_month = Month::new(2020, 6).unwrap();
    let investment_month = formation_month.succ();

    let points = points_for(formation_month, &[("A", 0.1), ("B", 0.9)]);
    // Returns exist in both months; only July may be used.
    let returns = MonthlyReturns::from_triples(vec![
        ("A", formation_month, 0.50),
        ("B", formation_month, -0.50),
        ("A", investment_month, 0.02),
        ("B", investment_month, 0.01),
    ]);

    let formation = engine.form(&points, &OpenUniverse).unwrap();
    let set = portfolio_returns(&formation.assignments, &returns, 2);

    let p1 = set.get(PortfolioId::Bucket(1)).unwrap();
    assert_eq!(p1.len(), 1);
    assert_eq!(p1[0].month, investment_month);
    assert_relative_eq!(p1[0].value, 0.02);
    assert!(set.iter().all(|r| r.month != formation_month));
}

#[test]
fn test_fewer_names_than_buckets_is_rejected() {
    let config = FormationConfig {
        buckets: 5,
        min_instruments: 3,
        lenient_min_instruments: None,
        lag: 1,
    };
    assert!(NtileFormation::new(config).is_err());
}

#[test]
fn test_smallest_allowed_month_fills_both_extremes() {
    let config = FormationConfig {
        buckets: 5,
        min_instruments: 5,
        lenient_min_instruments: None,
        lag: 1,
    };
    let engine = NtileFormation::new(config).unwrap();
    let month = Month::new(2021, 3).unwrap();
    let names = [("A", 0.1), ("B", 0.2), ("C", 0.3), ("D", 0.4), ("E", 0.5)];
    let points = points_for(month, &names);
    let returns = MonthlyReturns::from_triples(
        names
            .iter()
            .enumerate()
            .map(|(i, (symbol, _))| (*symbol, month.succ(), 0.01 * i as f64)),
    );

    let formation = engine.form(&points, &OpenUniverse).unwrap();
    assert_eq!(formation.months[0].bucket_sizes, vec![1, 1, 1, 1, 1]);

    let set = portfolio_returns(&formation.assignments, &returns, 5);
    let ls = set.long_short().unwrap();
    assert_eq!(ls.len(), 1);
    assert_relative_eq!(ls[0].value, -0.04);
}
