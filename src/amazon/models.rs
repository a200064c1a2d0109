//! Data models: the product identifier and the scraped listing record.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Placeholder for any detail field that is missing from the page.
pub const NOT_AVAILABLE: &str = "N/A";

/// Placeholder for a missing review count.
pub const NO_REVIEWS: &str = "0 reviews";

static DP_PATH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]{10})").unwrap());

/// Amazon Standard Identification Number: 10 uppercase alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Asin(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid ASIN '{0}': expected 10 uppercase alphanumeric characters")]
pub struct InvalidAsin(pub String);

impl Asin {
    /// Validates and wraps an identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidAsin> {
        if s.len() == 10 && s.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidAsin(s.to_string()))
        }
    }

    /// Extracts the identifier from a product link such as `/Some-Name/dp/B0CHX1W1XY/ref=sr_1_1`.
    pub fn from_href(href: &str) -> Option<Self> {
        if !href.contains("/dp/") {
            return None;
        }
        DP_PATH.captures(href).map(|caps| Self(caps[1].to_string()))
    }

    /// Canonical detail page URL on the given storefront.
    pub fn detail_url(&self, base_url: &str) -> String {
        format!("{}/dp/{}", base_url.trim_end_matches('/'), self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Asin {
    type Err = InvalidAsin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Asin {
    type Error = InvalidAsin;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Asin> for String {
    fn from(asin: Asin) -> Self {
        asin.0
    }
}

/// One scraped product record, exported as a CSV row.
///
/// Every field is text exactly as shown on the detail page. Missing values
/// hold [`NOT_AVAILABLE`] (or [`NO_REVIEWS`] for the review count), never an
/// empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "URL")]
    pub url: String,
    /// Locale formatted, e.g. `12,999.00`
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "Reviews")]
    pub reviews: String,
    #[serde(rename = "Availability")]
    pub availability: String,
}

impl Listing {
    /// Column names in export order.
    pub const HEADERS: [&'static str; 6] =
        ["Title", "URL", "Price", "Rating", "Reviews", "Availability"];

    /// A record for `url` with every field set to its placeholder.
    pub fn placeholder(url: impl Into<String>) -> Self {
        Self {
            title: NOT_AVAILABLE.to_string(),
            url: url.into(),
            price: NOT_AVAILABLE.to_string(),
            rating: NOT_AVAILABLE.to_string(),
            reviews: NO_REVIEWS.to_string(),
            availability: NOT_AVAILABLE.to_string(),
        }
    }

    /// Title shortened for log lines.
    pub fn short_title(&self) -> String {
        if self.title.chars().count() > 50 {
            format!("{}...", self.title.chars().take(50).collect::<String>())
        } else {
            self.title.clone()
        }
    }
}
