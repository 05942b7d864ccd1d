//! Per-portfolio alpha analysis.
//!
//! Each portfolio walks a fixed sequence of stages:
//!
//! ```text
//! Raw → Capm → ThreeFactor → FiveFactor → ModelSelected → Concluded
//! ```
//!
//! A richer specification that cannot be estimated is recorded as skipped and
//! the walk continues. CAPM is the floor: without it there is nothing to
//! select, so the whole analysis fails.

use crate::config::AggregatorConfig;
use crate::error::{AnalysisError, Result};
use derive_more::Display;
use hobart_data::FactorTable;
use hobart_portfolio::{PortfolioId, PortfolioReturn};
use hobart_stats::{FactorRegression, RegressionResult, SeriesSummary, Specification};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Stage of the per-portfolio analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub enum AnalysisStage {
    /// Raw return statistics
    Raw,
    /// Market model
    Capm,
    /// Fama-French three-factor model
    ThreeFactor,
    /// Fama-French five-factor model
    FiveFactor,
    /// Best-fitting specification chosen
    ModelSelected,
    /// Classification assigned
    Concluded,
}

impl AnalysisStage {
    /// The stage that follows, `None` once concluded.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Raw => Some(Self::Capm),
            Self::Capm => Some(Self::ThreeFactor),
            Self::ThreeFactor => Some(Self::FiveFactor),
            Self::FiveFactor => Some(Self::ModelSelected),
            Self::ModelSelected => Some(Self::Concluded),
            Self::Concluded => None,
        }
    }

    /// Specification estimated in this stage, if any.
    pub const fn specification(self) -> Option<Specification> {
        match self {
            Self::Capm => Some(Specification::Capm),
            Self::ThreeFactor => Some(Specification::ThreeFactor),
            Self::FiveFactor => Some(Specification::FiveFactor),
            _ => None,
        }
    }
}

/// What the evidence says about a portfolio's return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// The raw mean is not distinguishable from zero
    #[display("no raw significance")]
    NoRawSignificance,
    /// Significant raw return with an insignificant alpha in the selected model
    #[display("explained by factors")]
    ExplainedByFactors,
    /// Significant raw return and significant alpha in the selected model
    #[display("anomaly persists")]
    AnomalyPersists,
}

/// A specification that could not be estimated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSpecification {
    /// Specification
    pub specification: Specification,
    /// Why it was skipped
    pub reason: String,
}

/// Complete alpha analysis of one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaAnalysis {
    /// Portfolio
    pub portfolio: PortfolioId,
    /// Raw statistics on the months that have factor data
    pub raw: SeriesSummary,
    /// Successful regressions, simplest specification first
    pub regressions: Vec<RegressionResult>,
    /// Specifications that failed
    pub skipped: Vec<SkippedSpecification>,
    /// Specification with the best fit
    pub selected: Specification,
    /// Verdict
    pub classification: Classification,
}

impl AlphaAnalysis {
    /// Regression of the selected specification.
    pub fn selected_regression(&self) -> Option<&RegressionResult> {
        self.regression(self.selected)
    }

    /// Regression for `specification`, if it succeeded.
    pub fn regression(&self, specification: Specification) -> Option<&RegressionResult> {
        self.regressions
            .iter()
            .find(|r| r.specification == specification)
    }
}

/// Runs the stage sequence for individual portfolios.
#[derive(Debug, Clone, Copy)]
pub struct AlphaAggregator {
    config: AggregatorConfig,
    regression: FactorRegression,
}

impl AlphaAggregator {
    /// Create an aggregator.
    pub fn new(config: AggregatorConfig, regression: FactorRegression) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, regression })
    }

    /// Analyze one portfolio return series.
    pub fn analyze(
        &self,
        portfolio: PortfolioId,
        returns: &[PortfolioReturn],
        factors: &FactorTable,
    ) -> Result<AlphaAnalysis> {
        let mut raw = None;
        let mut regressions: Vec<RegressionResult> = Vec::new();
        let mut skipped = Vec::new();
        let mut selected = None;
        let mut classification = None;

        let mut stage = Some(AnalysisStage::Raw);
        while let Some(current) = stage {
            debug!(%portfolio, stage = %current, "Analysis stage");
            match (current, current.specification()) {
                (AnalysisStage::Raw, _) => {
                    let summary = SeriesSummary::aligned(returns, factors).map_err(|e| {
                        AnalysisError::InsufficientData(format!("{portfolio}: {e}"))
                    })?;
                    raw = Some(summary);
                }
                (_, Some(specification)) => {
                    match self.regression.fit(portfolio, returns, factors, specification) {
                        Ok(result) => regressions.push(result),
                        Err(e) if specification == Specification::Capm => {
                            return Err(AnalysisError::InsufficientData(format!(
                                "{portfolio}: CAPM could not be estimated: {e}"
                            )));
                        }
                        Err(e) => {
                            warn!(%portfolio, %specification, error = %e, "Skipping specification");
                            skipped.push(SkippedSpecification {
                                specification,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                (AnalysisStage::ModelSelected, _) => {
                    selected = self.select(&regressions);
                }
                (AnalysisStage::Concluded, _) => {
                    if let (Some(raw), Some(best)) = (raw.as_ref(), selected) {
                        let alpha_p = regressions
                            .iter()
                            .find(|r| r.specification == best)
                            .map_or(f64::NAN, |r| r.alpha_p_value);
                        classification = Some(self.classify(raw.p_value, alpha_p));
                    }
                }
                _ => {}
            }
            stage = current.next();
        }

        match (raw, selected, classification) {
            (Some(raw), Some(selected), Some(classification)) => {
                debug!(%portfolio, %selected, %classification, "Analysis concluded");
                Ok(AlphaAnalysis {
                    portfolio,
                    raw,
                    regressions,
                    skipped,
                    selected,
                    classification,
                })
            }
            _ => Err(AnalysisError::InsufficientData(format!(
                "{portfolio}: analysis did not conclude"
            ))),
        }
    }

    /// Highest R²; ties go to the specification with fewer factors.
    pub fn select(&self, regressions: &[RegressionResult]) -> Option<Specification> {
        let mut ordered: Vec<&RegressionResult> = regressions.iter().collect();
        ordered.sort_by_key(|r| r.specification.factor_count());

        let mut best: Option<&RegressionResult> = None;
        for candidate in ordered {
            best = match best {
                Some(current)
                    if candidate.r_squared <= current.r_squared + self.config.tie_tolerance =>
                {
                    Some(current)
                }
                _ => Some(candidate),
            };
        }
        best.map(|r| r.specification)
    }

    /// Label a portfolio from its raw and selected-alpha p-values.
    ///
    /// A NaN p-value never counts as significant.
    pub fn classify(&self, raw_p: f64, alpha_p: f64) -> Classification {
        let significance = self.config.significance;
        if !(raw_p < significance) {
            Classification::NoRawSignificance
        } else if alpha_p < significance {
            Classification::AnomalyPersists
        } else {
            Classification::ExplainedByFactors
        }
    }
}
