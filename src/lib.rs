//! Statistics for tracked time: breakdowns of a period by activity, todo or scope, comparison
//! with the previous period, calendar layout of a day and ring charts.
//! Everything is computed from an immutable snapshot of logs, nothing is ever written back
//! except through explicit imports.
//!

pub mod cli;
pub mod config;
pub mod snapshot;
pub mod stats;
pub mod utils;
