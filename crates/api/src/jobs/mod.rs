//! Background job runner and job implementations.

mod offline_sweep;
mod runner;

pub use offline_sweep::{OfflineSweepJob, SweepSummary, STALENESS_THRESHOLD_SECS};
pub use runner::{Job, JobRunner};
