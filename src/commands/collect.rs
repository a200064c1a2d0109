//! Link collection over paginated search results.

use crate::amazon::{parser, Asin, SearchRenderer};
use crate::config::Config;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Walks search result pages until enough product links are found.
pub struct LinkCollector {
    base_url: String,
    query: String,
    target: usize,
    max_pages: u32,
    delay_ms: u64,
    delay_jitter_ms: u64,
}

impl LinkCollector {
    /// Creates a collector for the configured query and storefront.
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.base_url(),
            query: config.query.clone(),
            target: config.target,
            max_pages: config.max_pages,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
        }
    }

    /// URL of the given 1-based search results page.
    pub fn page_url(&self, page: u32) -> String {
        format!("{}/s?k={}&page={}", self.base_url, urlencoding::encode(&self.query), page)
    }

    /// Collects up to `target` unique detail page URLs.
    ///
    /// Stops early, keeping what it has, when a page fails to render or the
    /// page limit is reached.
    pub async fn collect(&self, renderer: &impl SearchRenderer) -> Vec<String> {
        let mut seen: HashSet<Asin> = HashSet::new();
        let mut asins: Vec<Asin> = Vec::new();
        let mut page = 1;

        while asins.len() < self.target && page <= self.max_pages {
            let url = self.page_url(page);
            info!("Opening page {}: {}", page, url);

            let html = match renderer.render(&url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("Skipping page {} due to loading issues: {:#}", page, e);
                    break;
                }
            };

            let found = parser::parse_search_links(&html);
            let before = asins.len();
            for asin in found {
                if seen.insert(asin.clone()) {
                    asins.push(asin);
                }
            }
            debug!("Page {} added {} new products", page, asins.len() - before);
            info!("Found {} total products so far", asins.len());

            if asins.len() >= self.target {
                break;
            }

            page += 1;
            if page <= self.max_pages {
                self.delay().await;
            }
        }

        asins.truncate(self.target);
        asins.iter().map(|asin| asin.detail_url(&self.base_url)).collect()
    }

    /// Randomized pause between pages.
    async fn delay(&self) {
        if self.delay_ms == 0 && self.delay_jitter_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}
