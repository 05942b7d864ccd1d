#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod distribution;
pub mod error;
pub mod grs;
pub mod linalg;
pub mod ols;
pub mod regression;
pub mod specification;
pub mod summary;

pub use error::StatsError;
pub use grs::{GrsConfig, GrsTest, JointConclusion, JointTestResult};
pub use ols::{CovarianceType, OlsFit, ols};
pub use regression::{
    FactorLoading, FactorRegression, HARD_MIN_OBSERVATIONS, RegressionConfig, RegressionResult,
};
pub use specification::Specification;
pub use summary::{MONTHS_PER_YEAR, SeriesSummary};
