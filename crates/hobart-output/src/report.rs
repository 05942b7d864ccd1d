//! Human-readable summaries of an analysis run.

use chrono::{DateTime, Utc};
use hobart_analysis::{AlphaAnalysis, PipelineOutput};
use hobart_stats::{JointTestResult, RegressionResult, Specification};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Format a skipped computation.
pub fn not_applicable(reason: impl std::fmt::Display) -> String {
    format!("N/A ({reason})")
}

/// Formation stage summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormationSummary {
    /// Volatility estimates produced
    pub volatility_points: usize,
    /// Months ranked
    pub formation_months: usize,
    /// Months with candidates that were too thin to rank
    pub skipped_months: usize,
    /// Bucket count
    pub buckets: usize,
    /// Instrument threshold applied
    pub min_instruments: usize,
    /// Whether the lenient threshold was used
    pub lenient: bool,
}

/// One portfolio in the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSection {
    /// Portfolio label
    pub portfolio: String,
    /// Analysis, when it succeeded
    pub analysis: Option<AlphaAnalysis>,
    /// Failure reason otherwise
    pub failure: Option<String>,
}

/// One GRS test in the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JointTestSection {
    /// Specification
    pub specification: Specification,
    /// Result, when the test was applicable
    pub result: Option<JointTestResult>,
    /// Failure reason otherwise
    pub failure: Option<String>,
}

/// Summary report of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,
    /// Formation summary
    pub formation: FormationSummary,
    /// Portfolios, buckets first then long-short
    pub portfolios: Vec<PortfolioSection>,
    /// Joint tests, simplest specification first
    pub joint_tests: Vec<JointTestSection>,
}

impl Report {
    /// Build a report from a pipeline run.
    pub fn from_output(output: &PipelineOutput) -> Self {
        let formation = &output.run.formation;
        Self {
            timestamp: Utc::now(),
            formation: FormationSummary {
                volatility_points: output.run.volatility_points,
                formation_months: formation.months.len(),
                skipped_months: formation.skipped_months.len(),
                buckets: output.run.portfolios.buckets(),
                min_instruments: formation.min_instruments,
                lenient: formation.lenient,
            },
            portfolios: output
                .analyses
                .iter()
                .map(|o| PortfolioSection {
                    portfolio: o.portfolio.to_string(),
                    analysis: o.analysis.as_ref().ok().cloned(),
                    failure: o.analysis.as_ref().err().map(ToString::to_string),
                })
                .collect(),
            joint_tests: output
                .joint_tests
                .iter()
                .map(|j| JointTestSection {
                    specification: j.specification,
                    result: j.result.as_ref().ok().cloned(),
                    failure: j.result.as_ref().err().map(ToString::to_string),
                })
                .collect(),
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering for terminals.
    pub fn to_ascii_table(&self) -> String {
        let mut out = String::new();
        let f = &self.formation;

        let _ = writeln!(out, "\nLow-Volatility Alpha Analysis");
        let _ = writeln!(out, "{}", "=".repeat(96));
        let _ = writeln!(
            out,
            "Formation: {} months ranked into {} buckets (threshold {}{}), {} months skipped, {} volatility estimates",
            f.formation_months,
            f.buckets,
            f.min_instruments,
            if f.lenient { ", lenient" } else { "" },
            f.skipped_months,
            f.volatility_points
        );

        let _ = writeln!(out, "\n{:<10} {:>7} {:>10} {:>8} {:>8} {:>8} {:>8}", "Portfolio", "Months", "Mean", "Vol", "Sharpe", "t", "p");
        let _ = writeln!(out, "{}", "-".repeat(96));
        for section in &self.portfolios {
            match (&section.analysis, &section.failure) {
                (Some(a), _) => {
                    let _ = writeln!(
                        out,
                        "{:<10} {:>7} {:>9.2}% {:>7.2}% {:>8.2} {:>8.2} {:>8.4}",
                        section.portfolio,
                        a.raw.observations,
                        a.raw.mean * 100.0,
                        a.raw.annualized_volatility * 100.0,
                        a.raw.sharpe_ratio,
                        a.raw.t_stat,
                        a.raw.p_value
                    );
                    for specification in Specification::ALL {
                        let marker = if specification == a.selected { "*" } else { " " };
                        let _ = writeln!(
                            out,
                            "  {marker}{:<6} {}",
                            specification.to_string(),
                            regression_cell(a, specification)
                        );
                    }
                    let _ = writeln!(out, "   -> {}", a.classification);
                }
                (None, failure) => {
                    let _ = writeln!(
                        out,
                        "{:<10} {}",
                        section.portfolio,
                        not_applicable(failure.as_deref().unwrap_or("not analyzed"))
                    );
                }
            }
        }

        let _ = writeln!(out, "\nGRS joint tests");
        let _ = writeln!(out, "{}", "-".repeat(96));
        for section in &self.joint_tests {
            let _ = writeln!(out, "{:<6} {}", section.specification.to_string(), joint_cell(section));
        }
        let _ = writeln!(out, "{}", "=".repeat(96));
        out
    }

    /// Markdown rendering.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let f = &self.formation;

        out.push_str("# Low-Volatility Alpha Analysis\n\n");
        let _ = writeln!(
            out,
            "**Formation:** {} months, {} buckets, threshold {}{}, {} months skipped, {} volatility estimates\n",
            f.formation_months,
            f.buckets,
            f.min_instruments,
            if f.lenient { " (lenient)" } else { "" },
            f.skipped_months,
            f.volatility_points
        );

        out.push_str("| Portfolio | Months | Mean | Sharpe | t | p | CAPM α | FF3 α | FF5 α | Selected | Classification |\n");
        out.push_str("|-----------|--------|------|--------|---|---|--------|-------|-------|----------|----------------|\n");
        for section in &self.portfolios {
            match (&section.analysis, &section.failure) {
                (Some(a), _) => {
                    let _ = writeln!(
                        out,
                        "| {} | {} | {:.2}% | {:.2} | {:.2} | {:.4} | {} | {} | {} | {} | {} |",
                        section.portfolio,
                        a.raw.observations,
                        a.raw.mean * 100.0,
                        a.raw.sharpe_ratio,
                        a.raw.t_stat,
                        a.raw.p_value,
                        regression_cell(a, Specification::Capm),
                        regression_cell(a, Specification::ThreeFactor),
                        regression_cell(a, Specification::FiveFactor),
                        a.selected,
                        a.classification
                    );
                }
                (None, failure) => {
                    let _ = writeln!(
                        out,
                        "| {} | {} | | | | | | | | | |",
                        section.portfolio,
                        not_applicable(failure.as_deref().unwrap_or("not analyzed"))
                    );
                }
            }
        }

        out.push_str("\n## GRS Joint Tests\n\n");
        for section in &self.joint_tests {
            let _ = writeln!(out, "- **{}:** {}", section.specification, joint_cell(section));
        }
        out
    }
}

fn regression_cell(analysis: &AlphaAnalysis, specification: Specification) -> String {
    if let Some(r) = analysis.regression(specification) {
        return alpha_summary(r);
    }
    let reason = analysis
        .skipped
        .iter()
        .find(|s| s.specification == specification)
        .map_or("not estimated", |s| s.reason.as_str());
    not_applicable(reason)
}

fn alpha_summary(r: &RegressionResult) -> String {
    format!(
        "α {:.3}% (t {:.2}, p {:.4}), R² {:.3}",
        r.alpha * 100.0,
        r.alpha_t_stat,
        r.alpha_p_value,
        r.r_squared
    )
}

fn joint_cell(section: &JointTestSection) -> String {
    match (&section.result, &section.failure) {
        (Some(r), _) => format!(
            "F({}, {}) = {:.3}, p {:.4}, {} portfolios over {} months: {}",
            r.df1, r.df2, r.f_statistic, r.p_value, r.portfolios.len(), r.observations, r.conclusion
        ),
        (None, failure) => not_applicable(failure.as_deref().unwrap_or("not run")),
    }
}
