//! Amazon storefronts the harvester can target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Storefront whose search results and detail pages are harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    In,
    Us,
    Uk,
    Ca,
    Au,
    De,
    Jp,
}

impl Region {
    /// Returns the storefront domain.
    pub fn domain(&self) -> &'static str {
        match self {
            Region::In => "amazon.in",
            Region::Us => "amazon.com",
            Region::Uk => "amazon.co.uk",
            Region::Ca => "amazon.ca",
            Region::Au => "amazon.com.au",
            Region::De => "amazon.de",
            Region::Jp => "amazon.co.jp",
        }
    }

    /// Returns the base URL for this storefront.
    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain())
    }

    /// Returns the Accept-Language header value sent with detail requests.
    pub fn accept_language(&self) -> &'static str {
        match self {
            Region::In => "en-IN,en;q=0.9,hi;q=0.8",
            Region::Us | Region::Ca | Region::Au => "en-US,en;q=0.9",
            Region::Uk => "en-GB,en;q=0.9",
            Region::De => "de-DE,de;q=0.9,en;q=0.8",
            Region::Jp => "ja-JP,ja;q=0.9,en;q=0.8",
        }
    }

    /// Returns all supported storefronts.
    pub fn all() -> &'static [Region] {
        &[Region::In, Region::Us, Region::Uk, Region::Ca, Region::Au, Region::De, Region::Jp]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Region::In => "in",
            Region::Us => "us",
            Region::Uk => "uk",
            Region::Ca => "ca",
            Region::Au => "au",
            Region::De => "de",
            Region::Jp => "jp",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in" | "india" => Ok(Region::In),
            "us" | "usa" => Ok(Region::Us),
            "uk" | "gb" => Ok(Region::Uk),
            "ca" | "canada" => Ok(Region::Ca),
            "au" | "australia" => Ok(Region::Au),
            "de" | "germany" => Ok(Region::De),
            "jp" | "japan" => Ok(Region::Jp),
            _ => Err(RegionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown region '{0}'. Valid regions: {codes}", codes = region_codes())]
pub struct RegionParseError(String);

fn region_codes() -> String {
    Region::all().iter().map(Region::to_string).collect::<Vec<_>>().join(", ")
}
