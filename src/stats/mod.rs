//! Statistics over a [Snapshot](crate::snapshot::entities::Snapshot).
//!
//! Everything in here is a pure function of its inputs. Reference instants are always passed in
//! explicitly, [engine::StatsEngine] memoizes results on top.

pub mod aggregate;
pub mod comparison;
pub mod engine;
pub mod layout;
pub mod memo;
pub mod palette;
pub mod pie;
pub mod range;
pub mod taxonomy;
