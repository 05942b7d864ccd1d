//! End-to-end runs on synthetic prices and factors.

use approx::assert_relative_eq;
use chrono::{Datelike, Duration, NaiveDate};
use hobart_analysis::{AnalysisConfig, AnalysisContext, Pipeline, PipelineOutput};
use hobart_data::{
    FactorObservation, FactorTable, Month, PointInTimeUniverse, PriceObservation, PriceTable,
};
use hobart_portfolio::{FormationConfig, PortfolioId};
use hobart_signals::{Sampling, VolatilityConfig};
use hobart_stats::Specification;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use std::collections::BTreeSet;

const INSTRUMENTS: usize = 10;
const MONTHS: i32 = 36;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()
}

/// Daily random walks with volatility increasing in the instrument index.
fn synthetic_prices(seed: u64) -> PriceTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let end = start()
        .checked_add_months(chrono::Months::new(MONTHS as u32))
        .unwrap();
    let days = (end - start()).num_days();

    let mut observations = Vec::new();
    for i in 0..INSTRUMENTS {
        let noise = Normal::new(0.0002, 0.004 + 0.002 * i as f64).unwrap();
        let mut price = 40.0 + i as f64;
        for d in 0..days {
            let date = start() + Duration::days(d);
            if d > 0 {
                price *= noise.sample(&mut rng).exp();
            }
            observations.push(PriceObservation::new(format!("S{i}"), date, price));
        }
    }
    PriceTable::new(observations).unwrap()
}

fn synthetic_factors(seed: u64) -> FactorTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let market = Normal::new(0.006, 0.04).unwrap();
    let style = Normal::new(0.001, 0.02).unwrap();
    let first = Month::from_date(start());
    FactorTable::new((0..=MONTHS).map(|k| FactorObservation {
        month: first.add_months(k),
        market_excess: market.sample(&mut rng),
        size: Some(style.sample(&mut rng)),
        value: Some(style.sample(&mut rng)),
        profitability: Some(style.sample(&mut rng)),
        investment: Some(style.sample(&mut rng)),
        risk_free: 0.001,
    }))
    .unwrap()
}

fn config() -> AnalysisConfig {
    AnalysisConfig {
        volatility: VolatilityConfig {
            window: 20,
            sampling: Sampling::MonthEnd,
            ..Default::default()
        },
        formation: FormationConfig {
            buckets: 2,
            min_instruments: INSTRUMENTS,
            lenient_min_instruments: None,
            lag: 1,
        },
        ..Default::default()
    }
}

fn run(seed: u64) -> PipelineOutput {
    let context = AnalysisContext::new(synthetic_prices(seed), synthetic_factors(seed + 1));
    Pipeline::new(config()).unwrap().run(&context).unwrap()
}

/// Monthly return of the low (`low = true`) or high volatility names in month `k`.
///
/// The long-short spread is 0.006 + 0.002·((k mod 5) − 2), so over months
/// 1..=35 its mean is 0.006 and its sample variance 2.8e-4 / 34.
fn designed_return(low: bool, k: i64) -> f64 {
    let high = 0.004 + 0.001 * ((3 * k) % 7) as f64 - 0.003;
    let spread = 0.006 + 0.002 * ((k % 5) as f64 - 2.0);
    if low { high + spread } else { high }
}

/// Month-end closes follow [`designed_return`]; other days zig-zag around the
/// close with an amplitude that orders the instruments by volatility.
fn designed_prices() -> PriceTable {
    let first = Month::from_date(start());
    let end = start()
        .checked_add_months(chrono::Months::new(MONTHS as u32))
        .unwrap();

    let mut observations = Vec::new();
    for i in 0..INSTRUMENTS {
        let low = i < INSTRUMENTS / 2;
        let wiggle = if low {
            0.001 * (i + 1) as f64
        } else {
            0.02 * (i - 4) as f64
        };
        let mut close = 40.0 + i as f64;
        let mut month = first;
        let mut date = start();
        let mut day = 0;
        while date < end {
            let current = Month::from_date(date);
            if current != month {
                close *= 1.0 + designed_return(low, current.months_since(&first));
                month = current;
            }
            let month_end = date
                .succ_opt()
                .is_none_or(|next| Month::from_date(next) != current);
            let price = if month_end {
                close
            } else if day % 2 == 0 {
                close * (1.0 + wiggle)
            } else {
                close * (1.0 - wiggle)
            };
            observations.push(PriceObservation::new(format!("S{i}"), date, price));
            date += Duration::days(1);
            day += 1;
        }
    }
    PriceTable::new(observations).unwrap()
}

fn designed_factors() -> FactorTable {
    let first = Month::from_date(start());
    let pattern = |k: i32, step: i32, modulus: i32, scale: f64| {
        scale * (((step * k) % modulus) as f64 - (modulus / 2) as f64)
    };
    FactorTable::new((0..=MONTHS).map(|k| FactorObservation {
        month: first.add_months(k),
        market_excess: 0.005 + pattern(k, 7, 11, 0.004),
        size: Some(pattern(k, 5, 13, 0.002)),
        value: Some(pattern(k, 4, 17, 0.0015)),
        profitability: Some(pattern(k, 6, 19, 0.001)),
        investment: Some(pattern(k, 9, 23, 0.001)),
        risk_free: 0.001,
    }))
    .unwrap()
}

#[test]
fn test_designed_run_pins_long_short_statistics() {
    let context = AnalysisContext::new(designed_prices(), designed_factors());
    let output = Pipeline::new(config()).unwrap().run(&context).unwrap();

    // Low-volatility names always land in bucket 1.
    for assignment in &output.run.formation.assignments {
        let index: usize = assignment.symbol[1..].parse().unwrap();
        assert_eq!(assignment.bucket, if index < INSTRUMENTS / 2 { 1 } else { 2 });
    }

    let ls = output.long_short().unwrap();
    assert_eq!(ls.raw.observations, 35);
    assert_relative_eq!(ls.raw.mean, 0.006, epsilon = 1e-10);
    let expected_t = 0.006 * 35f64.sqrt() / (2.8e-4f64 / 34.0).sqrt();
    assert_relative_eq!(ls.raw.t_stat, expected_t, epsilon = 1e-8);

    // GRS against the textbook formula for two portfolios and one factor.
    let grs = output.joint_test(Specification::Capm).unwrap();
    assert_eq!(grs.observations, 35);
    assert_eq!(grs.df1, 2);
    assert_eq!(grs.df2, 32);

    let capm: Vec<_> = [PortfolioId::Bucket(1), PortfolioId::Bucket(2)]
        .iter()
        .map(|id| {
            output
                .successful()
                .find(|a| a.portfolio == *id)
                .and_then(|a| a.regression(Specification::Capm))
                .unwrap()
        })
        .collect();
    let t = 35.0;
    let market: Vec<f64> = capm[0]
        .months
        .iter()
        .map(|m| context.factors().get(m).unwrap().market_excess)
        .collect();
    let mu = market.iter().sum::<f64>() / t;
    let var = market.iter().map(|m| (m - mu).powi(2)).sum::<f64>() / (t - 1.0);
    let cross = |i: usize, j: usize| {
        capm[i]
            .residuals
            .iter()
            .zip(&capm[j].residuals)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / (t - 2.0)
    };
    let (s11, s12, s22) = (cross(0, 0), cross(0, 1), cross(1, 1));
    let (a1, a2) = (capm[0].alpha, capm[1].alpha);
    let quad = (a1 * a1 * s22 - 2.0 * a1 * a2 * s12 + a2 * a2 * s11) / (s11 * s22 - s12 * s12);
    let expected_f = (t / 2.0) * ((t - 3.0) / (t - 2.0)) * quad / (1.0 + mu * mu / var);
    assert_relative_eq!(grs.f_statistic, expected_f, max_relative = 1e-8);
}

#[test]
fn test_end_to_end_is_reproducible() {
    let first = run(2024);
    let second = run(2024);
    let ls_first = first.long_short().unwrap();
    let ls_second = second.long_short().unwrap();
    assert_eq!(ls_first.raw.mean, ls_second.raw.mean);
    assert_eq!(ls_first.raw.t_stat, ls_second.raw.t_stat);
    assert_eq!(
        first.joint_test(Specification::Capm).unwrap().f_statistic,
        second.joint_test(Specification::Capm).unwrap().f_statistic
    );
}

#[test]
fn test_end_to_end_shape() {
    let output = run(99);

    // Every formation month ranks all ten instruments into two buckets of five.
    assert!(!output.run.formation.lenient);
    for month in &output.run.formation.months {
        assert_eq!(month.instruments, INSTRUMENTS);
        assert_eq!(month.bucket_sizes, vec![5, 5]);
    }

    let ls = output.run.portfolios.long_short().unwrap();
    assert!(ls.len() >= 34, "long-short months: {}", ls.len());

    // Low-volatility names have smaller absolute returns on average.
    let p1 = output.run.portfolios.get(PortfolioId::Bucket(1)).unwrap();
    let p2 = output.run.portfolios.get(PortfolioId::Bucket(2)).unwrap();
    let dispersion = |s: &[hobart_portfolio::PortfolioReturn]| {
        s.iter().map(|r| r.value.abs()).sum::<f64>() / s.len() as f64
    };
    assert!(dispersion(p1) < dispersion(p2));

    assert_eq!(output.analyses.len(), 3);
    for analysis in output.successful() {
        assert_eq!(analysis.regressions.len(), 3);
        assert!(analysis.skipped.is_empty());
        assert!(analysis.selected_regression().is_some());
    }

    let ls_analysis = output.long_short().unwrap();
    let values: Vec<f64> = ls.iter().map(|r| r.value).collect();
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    assert_relative_eq!(ls_analysis.raw.mean, mean, epsilon = 1e-12);

    for specification in Specification::ALL {
        let grs = output.joint_test(specification).unwrap();
        assert_eq!(grs.df2, grs.observations - 2 - specification.factor_count());
    }
}

#[test]
fn test_point_in_time_universe_restricts_ranking() {
    let prices = synthetic_prices(5);
    let factors = synthetic_factors(6);

    // Only the first eight instruments are ever eligible.
    let first = Month::from_date(start());
    let eligible: BTreeSet<String> = (0..8).map(|i| format!("S{i}")).collect();
    let universe = PointInTimeUniverse::from_pairs(
        (0..=MONTHS).flat_map(|k| eligible.iter().map(move |s| (first.add_months(k), s.clone()))),
    );

    let mut config = config();
    config.formation.min_instruments = 8;
    let context = AnalysisContext::new(prices, factors).with_universe(universe);
    let run = Pipeline::new(config).unwrap().form_portfolios(&context).unwrap();

    assert!(
        run.formation
            .assignments
            .iter()
            .all(|a| eligible.contains(&a.symbol))
    );
    assert!(run.formation.months.iter().all(|m| m.instruments == 8));
    assert!(run.formation.months.iter().all(|m| m.eligible == Some(8)));
    assert!(
        run.formation
            .months
            .iter()
            .all(|m| m.month.year() >= start().year())
    );
}

#[test]
fn test_invalid_configuration_fails_before_work() {
    let mut config = config();
    config.formation.lag = -1;
    assert!(Pipeline::new(config).is_err());
}
