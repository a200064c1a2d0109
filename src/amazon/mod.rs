//! Amazon-specific modules: browser rendering, detail HTTP client, parsing, and data models.

pub mod agents;
pub mod browser;
pub mod client;
pub mod models;
pub mod parser;
pub mod regions;
pub mod selectors;

pub use browser::{BrowserSession, SearchRenderer};
pub use client::{DetailClient, FetchError};
pub use models::{Asin, InvalidAsin, Listing};
pub use regions::Region;
