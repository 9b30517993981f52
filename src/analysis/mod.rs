//! Analysis modules.
//!
//! Descriptive statistics and group-bys over the movie table.

pub mod aggregator;

pub use aggregator::*;
