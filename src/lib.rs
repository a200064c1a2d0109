//! amz-harvest - Amazon search listing harvester
//!
//! Discovers product links from browser-rendered search results, scrapes
//! each detail page over plain HTTP with a bounded worker pool, and writes
//! the listings to CSV.

pub mod amazon;
pub mod commands;
pub mod config;
pub mod format;

pub use amazon::models::{Asin, Listing};
pub use amazon::regions::Region;
pub use config::Config;
