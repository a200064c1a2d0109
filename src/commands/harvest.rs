//! End-to-end harvest: collect links in the browser, scrape details concurrently, export CSV.

use crate::amazon::{BrowserSession, DetailClient, Listing, SearchRenderer};
use crate::commands::collect::LinkCollector;
use crate::config::Config;
use crate::format;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of a harvest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Product links discovered in search results
    pub links: usize,
    /// Listings written to the CSV
    pub listings: usize,
    pub output: PathBuf,
}

/// Runs the two-phase harvest.
pub struct HarvestCommand {
    config: Config,
}

impl HarvestCommand {
    /// Creates a new harvest command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Launches the browser, harvests, and writes the CSV.
    pub async fn execute(&self) -> Result<HarvestSummary> {
        info!("Starting the scraping process...");

        let browser =
            BrowserSession::launch(&self.config).await.context("Failed to launch browser")?;
        let links = LinkCollector::new(&self.config).collect(&browser).await;
        if let Err(e) = browser.close().await {
            warn!("{:#}", e);
        }

        let client = DetailClient::new(&self.config).context("Failed to create HTTP client")?;
        self.finish(&client, links).await
    }

    /// Harvests with a provided renderer instead of a live browser (for testing).
    pub async fn execute_with_renderer(
        &self,
        renderer: &impl SearchRenderer,
    ) -> Result<HarvestSummary> {
        let links = LinkCollector::new(&self.config).collect(renderer).await;
        let client = DetailClient::new(&self.config).context("Failed to create HTTP client")?;
        self.finish(&client, links).await
    }

    async fn finish(&self, client: &DetailClient, links: Vec<String>) -> Result<HarvestSummary> {
        let link_count = links.len();
        let listings = self.scrape_all(client, links).await;

        format::write_listings(&self.config.output, &listings)?;
        info!(
            "Scraping complete! {} of {} products saved to {}",
            listings.len(),
            link_count,
            self.config.output.display()
        );

        Ok(HarvestSummary {
            links: link_count,
            listings: listings.len(),
            output: self.config.output.clone(),
        })
    }

    /// Fetches every link with at most `workers` requests in flight.
    ///
    /// Results arrive in completion order; failed pages are dropped.
    pub async fn scrape_all(&self, client: &DetailClient, links: Vec<String>) -> Vec<Listing> {
        self.scrape_with(links, |url| async move { client.fetch_listing(&url).await }).await
    }

    /// Runs `fetch` over every link, `workers` at a time.
    async fn scrape_with<F, Fut>(&self, links: Vec<String>, fetch: F) -> Vec<Listing>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Option<Listing>>,
    {
        let workers = self.config.workers.max(1);
        info!("Scraping {} product pages with {} workers", links.len(), workers);

        stream::iter(links)
            .map(fetch)
            .buffer_unordered(workers)
            .filter_map(|listing| async move { listing })
            .collect()
            .await
    }
}
