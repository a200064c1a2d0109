//! Harvest pipeline stages.

pub mod collect;
pub mod harvest;

pub use collect::LinkCollector;
pub use harvest::{HarvestCommand, HarvestSummary};
