#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use hobart_analysis as analysis;
pub use hobart_data as data;
pub use hobart_output as output;
pub use hobart_portfolio as portfolio;
pub use hobart_signals as signals;
pub use hobart_stats as stats;

pub use hobart_analysis::{
    AlphaAnalysis, AnalysisConfig, AnalysisContext, AnalysisError, Classification, Pipeline,
    PipelineOutput,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
