#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod formation;
pub mod returns;

pub use config::FormationConfig;
pub use error::PortfolioError;
pub use formation::{
    Formation, FormationMonth, NtileFormation, PortfolioAssignment, bucket_for_rank,
};
pub use returns::{
    MonthlyReturns, PortfolioId, PortfolioReturn, PortfolioSet, long_short, portfolio_returns,
};
