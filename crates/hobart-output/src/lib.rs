#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;

pub use export::{
    AnalysisRow, ExportError, ExportFormat, Exporter, JointTestRow, PortfolioReturnRow,
    RegressionRow, RunTables, export_run,
};
pub use report::{
    FormationSummary, JointTestSection, PortfolioSection, Report, not_applicable,
};
