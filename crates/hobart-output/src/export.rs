//! CSV and JSON export of analysis results.
//!
//! Results are flattened into one row type per table so every table can be
//! written as CSV. Computations that failed keep their row, with a `status`
//! of `"n/a"` and the reason in `note`.

use hobart_analysis::{JointOutcome, PipelineOutput, PortfolioOutcome};
use hobart_portfolio::PortfolioReturn;
use hobart_stats::RegressionResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8.
    #[error("Invalid UTF-8 in output: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

const OK: &str = "ok";
const NOT_APPLICABLE: &str = "n/a";

/// One portfolio return.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioReturnRow {
    /// Portfolio label (`P1`..`PN`, `LS`)
    pub portfolio: String,
    /// Holding month, `YYYY-MM`
    pub month: String,
    /// Equal-weighted return
    pub value: f64,
    /// Constituents with a realized return
    pub constituents: usize,
}

impl From<&PortfolioReturn> for PortfolioReturnRow {
    fn from(r: &PortfolioReturn) -> Self {
        Self {
            portfolio: r.portfolio.to_string(),
            month: r.month.to_string(),
            value: r.value,
            constituents: r.constituents,
        }
    }
}

/// One coefficient of one regression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionRow {
    /// Portfolio label
    pub portfolio: String,
    /// Specification (`CAPM`, `FF3`, `FF5`)
    pub specification: String,
    /// `alpha` or a factor name
    pub term: String,
    /// Point estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: f64,
    /// t statistic
    pub t_stat: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// R² of the regression
    pub r_squared: f64,
    /// Adjusted R² of the regression
    pub adj_r_squared: f64,
    /// Sample size
    pub observations: usize,
}

impl RegressionRow {
    /// Flatten a regression into one row per coefficient, alpha first.
    pub fn from_result(result: &RegressionResult) -> Vec<Self> {
        let row = |term: String, estimate, std_error, t_stat, p_value| Self {
            portfolio: result.portfolio.to_string(),
            specification: result.specification.to_string(),
            term,
            estimate,
            std_error,
            t_stat,
            p_value,
            r_squared: result.r_squared,
            adj_r_squared: result.adj_r_squared,
            observations: result.observations,
        };

        std::iter::once(row(
            "alpha".to_string(),
            result.alpha,
            result.alpha_std_error,
            result.alpha_t_stat,
            result.alpha_p_value,
        ))
        .chain(result.loadings.iter().map(|l| {
            row(
                l.factor.to_string(),
                l.estimate,
                l.std_error,
                l.t_stat,
                l.p_value,
            )
        }))
        .collect()
    }
}

/// Headline numbers of one portfolio's alpha analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRow {
    /// Portfolio label
    pub portfolio: String,
    /// `ok` or `n/a`
    pub status: String,
    /// Months in the raw sample
    pub observations: Option<usize>,
    /// Mean monthly return
    pub raw_mean: Option<f64>,
    /// Annualized volatility
    pub annualized_volatility: Option<f64>,
    /// Annualized Sharpe ratio
    pub sharpe_ratio: Option<f64>,
    /// t statistic of the raw mean
    pub raw_t_stat: Option<f64>,
    /// p-value of the raw mean
    pub raw_p_value: Option<f64>,
    /// Selected specification
    pub selected: Option<String>,
    /// Alpha of the selected specification
    pub alpha: Option<f64>,
    /// p-value of that alpha
    pub alpha_p_value: Option<f64>,
    /// Classification label
    pub classification: Option<String>,
    /// Failure reason or skipped specifications
    pub note: String,
}

impl From<&PortfolioOutcome> for AnalysisRow {
    fn from(outcome: &PortfolioOutcome) -> Self {
        match &outcome.analysis {
            Ok(a) => {
                let selected = a.selected_regression();
                let note = a
                    .skipped
                    .iter()
                    .map(|s| format!("{} skipped: {}", s.specification, s.reason))
                    .collect::<Vec<_>>()
                    .join("; ");
                Self {
                    portfolio: a.portfolio.to_string(),
                    status: OK.to_string(),
                    observations: Some(a.raw.observations),
                    raw_mean: Some(a.raw.mean),
                    annualized_volatility: Some(a.raw.annualized_volatility),
                    sharpe_ratio: Some(a.raw.sharpe_ratio),
                    raw_t_stat: Some(a.raw.t_stat),
                    raw_p_value: Some(a.raw.p_value),
                    selected: Some(a.selected.to_string()),
                    alpha: selected.map(|r| r.alpha),
                    alpha_p_value: selected.map(|r| r.alpha_p_value),
                    classification: Some(a.classification.to_string()),
                    note,
                }
            }
            Err(e) => Self {
                portfolio: outcome.portfolio.to_string(),
                status: NOT_APPLICABLE.to_string(),
                observations: None,
                raw_mean: None,
                annualized_volatility: None,
                sharpe_ratio: None,
                raw_t_stat: None,
                raw_p_value: None,
                selected: None,
                alpha: None,
                alpha_p_value: None,
                classification: None,
                note: e.to_string(),
            },
        }
    }
}

/// One GRS joint test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JointTestRow {
    /// Specification
    pub specification: String,
    /// `ok` or `n/a`
    pub status: String,
    /// GRS F statistic
    pub f_statistic: Option<f64>,
    /// p-value
    pub p_value: Option<f64>,
    /// Numerator degrees of freedom
    pub df1: Option<usize>,
    /// Denominator degrees of freedom
    pub df2: Option<usize>,
    /// Common months
    pub observations: Option<usize>,
    /// Conclusion label
    pub conclusion: Option<String>,
    /// Failure reason
    pub note: String,
}

impl From<&JointOutcome> for JointTestRow {
    fn from(outcome: &JointOutcome) -> Self {
        let specification = outcome.specification.to_string();
        match &outcome.result {
            Ok(r) => Self {
                specification,
                status: OK.to_string(),
                f_statistic: Some(r.f_statistic),
                p_value: Some(r.p_value),
                df1: Some(r.df1),
                df2: Some(r.df2),
                observations: Some(r.observations),
                conclusion: Some(r.conclusion.to_string()),
                note: String::new(),
            },
            Err(e) => Self {
                specification,
                status: NOT_APPLICABLE.to_string(),
                f_statistic: None,
                p_value: None,
                df1: None,
                df2: None,
                observations: None,
                conclusion: None,
                note: e.to_string(),
            },
        }
    }
}

/// Every exportable table of a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunTables {
    /// Portfolio return series
    pub portfolio_returns: Vec<PortfolioReturnRow>,
    /// Regression coefficients
    pub regressions: Vec<RegressionRow>,
    /// Per-portfolio analysis summaries
    pub analyses: Vec<AnalysisRow>,
    /// GRS tests
    pub joint_tests: Vec<JointTestRow>,
}

impl RunTables {
    /// Flatten a pipeline run.
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            portfolio_returns: output
                .run
                .portfolios
                .iter()
                .map(PortfolioReturnRow::from)
                .collect(),
            regressions: output
                .successful()
                .flat_map(|a| a.regressions.iter())
                .flat_map(RegressionRow::from_result)
                .collect(),
            analyses: output.analyses.iter().map(AnalysisRow::from).collect(),
            joint_tests: output.joint_tests.iter().map(JointTestRow::from).collect(),
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<'a, T: Serialize + 'a>(rows: impl IntoIterator<Item = &'a T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

macro_rules! impl_row_exporter {
    ($($row:ty),* $(,)?) => {
        $(
            impl Exporter for Vec<$row> {
                fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
                    match format {
                        ExportFormat::Csv => csv_string(self),
                        ExportFormat::Json => Ok(serde_json::to_string(self)?),
                        ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
                    }
                }
            }
        )*
    };
}

impl_row_exporter!(PortfolioReturnRow, RegressionRow, AnalysisRow, JointTestRow);

/// Write every table of `tables` into `dir` and return the created paths.
///
/// File names are `portfolio_returns`, `regressions`, `analyses` and
/// `joint_tests` with the extension of `format`.
pub fn export_run(
    tables: &RunTables,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = |name: &str| dir.join(format!("{name}.{}", format.extension()));

    let written = vec![
        (path("portfolio_returns"), &tables.portfolio_returns as &dyn Exporter),
        (path("regressions"), &tables.regressions as &dyn Exporter),
        (path("analyses"), &tables.analyses as &dyn Exporter),
        (path("joint_tests"), &tables.joint_tests as &dyn Exporter),
    ];
    for (file, table) in &written {
        table.export_to_file(file, format)?;
    }
    Ok(written.into_iter().map(|(file, _)| file).collect())
}
