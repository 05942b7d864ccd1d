#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod factors;
pub mod frame;
pub mod loader;
pub mod month;
pub mod prices;
pub mod universe;

pub use error::{DataError, Result};
pub use factors::{FactorName, FactorObservation, FactorTable, FactorUnits};
pub use loader::{
    read_factors, read_factors_path, read_membership, read_membership_path, read_prices,
    read_prices_path,
};
pub use month::Month;
pub use prices::{DatedPrice, PriceObservation, PriceTable};
pub use universe::{OpenUniverse, PointInTimeUniverse, Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
