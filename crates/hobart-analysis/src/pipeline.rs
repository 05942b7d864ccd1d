//! Full analysis run: volatility → formation → portfolio returns → alphas → GRS.

use crate::aggregator::{AlphaAggregator, AlphaAnalysis};
use crate::config::AnalysisConfig;
use crate::context::AnalysisContext;
use crate::error::{AnalysisError, Result};
use hobart_portfolio::{
    Formation, MonthlyReturns, NtileFormation, PortfolioId, PortfolioSet, portfolio_returns,
};
use hobart_signals::RollingVolatility;
use hobart_stats::{
    FactorRegression, GrsTest, JointTestResult, RegressionResult, Specification, StatsError,
};
use rayon::prelude::*;
use tracing::{info, warn};

/// Formation stage output.
#[derive(Debug, Clone)]
pub struct PortfolioRun {
    /// Number of volatility estimates produced
    pub volatility_points: usize,
    /// Bucket assignments
    pub formation: Formation,
    /// Bucket and long-short return series
    pub portfolios: PortfolioSet,
}

/// Alpha analysis of one portfolio, or why it could not be produced.
#[derive(Debug)]
pub struct PortfolioOutcome {
    /// Portfolio
    pub portfolio: PortfolioId,
    /// Analysis or failure
    pub analysis: Result<AlphaAnalysis>,
}

/// GRS result for one specification, or why it is not applicable.
#[derive(Debug, Clone)]
pub struct JointOutcome {
    /// Specification
    pub specification: Specification,
    /// Test result or failure
    pub result: std::result::Result<JointTestResult, StatsError>,
}

/// Everything a run produces.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Formation stage output
    pub run: PortfolioRun,
    /// One entry per portfolio, buckets first then long-short
    pub analyses: Vec<PortfolioOutcome>,
    /// One entry per specification, simplest first
    pub joint_tests: Vec<JointOutcome>,
}

impl PipelineOutput {
    /// Successful analyses.
    pub fn successful(&self) -> impl Iterator<Item = &AlphaAnalysis> {
        self.analyses.iter().filter_map(|o| o.analysis.as_ref().ok())
    }

    /// Analysis of the long-short spread, if it succeeded.
    pub fn long_short(&self) -> Option<&AlphaAnalysis> {
        self.successful()
            .find(|a| a.portfolio == PortfolioId::LongShort)
    }

    /// Joint test for `specification`, if it succeeded.
    pub fn joint_test(&self, specification: Specification) -> Option<&JointTestResult> {
        self.joint_tests
            .iter()
            .find(|j| j.specification == specification)
            .and_then(|j| j.result.as_ref().ok())
    }
}

/// Low-volatility alpha testing pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    volatility: RollingVolatility,
    formation: NtileFormation,
    aggregator: AlphaAggregator,
    grs: GrsTest,
}

impl Pipeline {
    /// Validate `config` and build every stage.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let regression = FactorRegression::new(config.regression)?;
        Ok(Self {
            volatility: RollingVolatility::new(config.volatility)?,
            formation: NtileFormation::new(config.formation)?,
            aggregator: AlphaAggregator::new(config.aggregator, regression)?,
            grs: GrsTest::new(config.grs)?,
        })
    }

    /// Estimate volatility, form portfolios and compute their returns.
    pub fn form_portfolios(&self, context: &AnalysisContext) -> Result<PortfolioRun> {
        let points = self.volatility.estimate(context.prices())?;
        if points.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "no instrument has enough price history for a volatility estimate".to_string(),
            ));
        }

        let formation = self.formation.form(&points, context.universe())?;
        let monthly = MonthlyReturns::from_prices(context.prices());
        let portfolios = portfolio_returns(
            &formation.assignments,
            &monthly,
            self.formation.config().buckets,
        );

        info!(
            volatility_points = points.len(),
            formation_months = formation.months.len(),
            portfolios = portfolios.ids().count(),
            lenient = formation.lenient,
            "Formed portfolios"
        );

        Ok(PortfolioRun {
            volatility_points: points.len(),
            formation,
            portfolios,
        })
    }

    /// Run every stage.
    pub fn run(&self, context: &AnalysisContext) -> Result<PipelineOutput> {
        let run = self.form_portfolios(context)?;
        let factors = context.factors();

        let series: Vec<_> = run
            .portfolios
            .ids()
            .filter_map(|id| run.portfolios.get(id).map(|s| (id, s)))
            .collect();

        let analyses: Vec<PortfolioOutcome> = series
            .par_iter()
            .map(|(portfolio, returns)| PortfolioOutcome {
                portfolio: *portfolio,
                analysis: self.aggregator.analyze(*portfolio, returns, factors),
            })
            .collect();

        for outcome in &analyses {
            if let Err(e) = &outcome.analysis {
                warn!(portfolio = %outcome.portfolio, error = %e, "Portfolio analysis failed");
            }
        }

        let joint_tests = Specification::ALL
            .iter()
            .map(|&specification| {
                // The long-short series is a linear combination of two buckets.
                let results: Vec<RegressionResult> = analyses
                    .iter()
                    .filter(|o| matches!(o.portfolio, PortfolioId::Bucket(_)))
                    .filter_map(|o| o.analysis.as_ref().ok())
                    .filter_map(|a| a.regression(specification).cloned())
                    .collect();
                let result = self.grs.test(&results, factors);
                if let Err(e) = &result {
                    warn!(%specification, error = %e, "GRS test not applicable");
                }
                JointOutcome {
                    specification,
                    result,
                }
            })
            .collect();

        let output = PipelineOutput {
            run,
            analyses,
            joint_tests,
        };

        info!(
            portfolios = output.analyses.len(),
            analyzed = output.successful().count(),
            long_short = ?output.long_short().map(|a| a.classification),
            "Analysis complete"
        );

        Ok(output)
    }
}
