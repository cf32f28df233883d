#![warn(missing_docs)]
//! Deterministic testing surfaces: typed event logs, mesh snapshots and run reports.

mod events;
mod metrics;

pub use events::*;
pub use metrics::*;
