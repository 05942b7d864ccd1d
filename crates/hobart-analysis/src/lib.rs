#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregator;
pub mod config;
pub mod context;
pub mod error;
pub mod pipeline;

pub use aggregator::{
    AlphaAggregator, AlphaAnalysis, AnalysisStage, Classification, SkippedSpecification,
};
pub use config::{AggregatorConfig, AnalysisConfig};
pub use context::AnalysisContext;
pub use error::{AnalysisError, Result};
pub use pipeline::{JointOutcome, Pipeline, PipelineOutput, PortfolioOutcome, PortfolioRun};
