//! Environmentally extended input-output (EEIO) analysis
//!
//! Computes the Leontief inverse of a multi-regional input-output table,
//! production and consumption footprints per region, and scope 1/2/3
//! emissions per industry, for datasets laid out like EXIOBASE.
//!
//! Every matrix carries the ordered labels of its axes ([`index::MultiIndex`])
//! and every product checks them, so tables from different aggregation
//! levels or orderings cannot be combined by accident.

pub mod config;
pub mod diagonal;
pub mod errors;
pub mod footprint;
pub mod index;
pub mod leontief;
pub mod loader;
pub mod pipeline;
pub mod scope;
pub mod table;
pub mod units;

pub use errors::{EEIOError, EEIOResult};
