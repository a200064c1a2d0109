//! Detail page fetcher: one shared HTTP session with retry and exponential backoff.

use crate::amazon::agents::random_user_agent;
use crate::amazon::models::Listing;
use crate::amazon::parser;
use crate::amazon::regions::Region;
use crate::config::Config;
use anyhow::{Context, Result};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Why a single detail request attempt failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] wreq::Error),

    #[error("request failed with status: {0}")]
    Status(u16),

    #[error("blocked by CAPTCHA or error page")]
    Blocked,
}

/// HTTP client for product detail pages, shared by every worker.
pub struct DetailClient {
    client: Client,
    region: Region,
    max_attempts: u32,
    retry_backoff: Duration,
}

impl DetailClient {
    /// Creates a new detail client with the given configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            region: config.region,
            max_attempts: config.max_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// Performs one GET with a rotated User-Agent and returns the page body.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", random_user_agent())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8")
            .header("Accept-Language", self.region.accept_language())
            .header("Cache-Control", "no-cache")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {} for {}", status, url);

        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        if parser::is_blocked_page(&body) {
            return Err(FetchError::Blocked);
        }

        Ok(body)
    }

    /// Fetches and parses one detail page.
    ///
    /// Makes up to `max_attempts` tries, sleeping `retry_backoff * 2^attempt`
    /// after each failure. Returns `None` once every attempt has failed.
    pub async fn fetch_listing(&self, url: &str) -> Option<Listing> {
        info!("Scraping: {}", url);

        for attempt in 0..self.max_attempts {
            match self.fetch_page(url).await {
                Ok(html) => {
                    let listing = parser::parse_listing(&html, url);
                    info!(
                        "Scraped: {} (Price: {}, Rating: {}, Reviews: {})",
                        listing.short_title(),
                        listing.price,
                        listing.rating,
                        listing.reviews
                    );
                    return Some(listing);
                }
                Err(e) => {
                    let backoff = self.backoff(attempt);
                    warn!(
                        "Error fetching {} (attempt {}/{}): {}; {} {:?}",
                        url,
                        attempt + 1,
                        self.max_attempts,
                        e,
                        self.failure_action(attempt),
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        warn!("Giving up on {} after {} attempts", url, self.max_attempts);
        None
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Log wording for the pause after a failed attempt.
    fn failure_action(&self, attempt: u32) -> &'static str {
        if attempt + 1 < self.max_attempts {
            "retrying after"
        } else {
            "no attempts left, backing off"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PRODUCT_HTML: &str = r#"
        <html><body>
            <span id="productTitle">Redmi 13C (Starfrost White, 4GB RAM, 128GB Storage)</span>
            <span class="a-price-whole">7,999.</span><span class="a-price-fraction">00</span>
            <span class="a-icon-alt">4.0 out of 5 stars</span>
            <span id="acrCustomerReviewText">3,210 ratings</span>
            <div id="availability"><span>In stock</span></div>
        </body></html>
    "#;

    fn make_test_config(backoff_ms: u64) -> Config {
        Config { retry_backoff_ms: backoff_ms, request_timeout_secs: 5, ..Config::default() }
    }

    #[test]
    fn test_backoff_doubles() {
        let client = DetailClient::new(&make_test_config(1000)).unwrap();
        assert_eq!(client.backoff(0), Duration::from_secs(1));
        assert_eq!(client.backoff(1), Duration::from_secs(2));
        assert_eq!(client.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_failure_action_only_promises_retry_when_one_follows() {
        let client = DetailClient::new(&make_test_config(1000)).unwrap();
        assert_eq!(client.failure_action(0), "retrying after");
        assert_eq!(client.failure_action(1), "retrying after");
        assert_eq!(client.failure_action(2), "no attempts left, backing off");
    }

    #[tokio::test]
    async fn test_fetch_listing_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B0CQYFPSCS"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_HTML))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DetailClient::new(&make_test_config(10)).unwrap();
        let url = format!("{}/dp/B0CQYFPSCS", mock_server.uri());

        let listing = client.fetch_listing(&url).await.unwrap();
        assert_eq!(listing.title, "Redmi 13C (Starfrost White, 4GB RAM, 128GB Storage)");
        assert_eq!(listing.url, url);
        assert_eq!(listing.price, "7,999.00");
        assert_eq!(listing.rating, "4.0 out of 5 stars");
        assert_eq!(listing.reviews, "3,210 ratings");
        assert_eq!(listing.availability, "In stock");
    }

    #[tokio::test]
    async fn test_fetch_listing_gives_up_after_three_failures() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B0CQYFPSCS"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = DetailClient::new(&make_test_config(10)).unwrap();
        let url = format!("{}/dp/B0CQYFPSCS", mock_server.uri());

        assert!(client.fetch_listing(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_listing_recovers_on_second_attempt_after_backoff() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B0CQYFPSCS"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/dp/B0CQYFPSCS"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_HTML))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DetailClient::new(&make_test_config(1000)).unwrap();
        let url = format!("{}/dp/B0CQYFPSCS", mock_server.uri());

        let start = Instant::now();
        let listing = client.fetch_listing(&url).await;
        let elapsed = start.elapsed();

        assert!(listing.is_some());
        assert!(elapsed >= Duration::from_secs(1), "elapsed only {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "waited too long: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_captcha_page_counts_as_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B0CQYFPSCS"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><form action="/errors/validateCaptcha"></form></html>"#,
            ))
            .expect(2)
            .mount(&mock_server)
            .await;

        let config = Config { max_attempts: 2, ..make_test_config(10) };
        let client = DetailClient::new(&config).unwrap();
        let url = format!("{}/dp/B0CQYFPSCS", mock_server.uri());

        assert!(client.fetch_listing(&url).await.is_none());
    }

    #[tokio::test]
    async fn test_pet_product_page_is_scraped_on_first_attempt() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/dp/B07DOGF00D"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body>
                    <span id="productTitle">Drools Adult Dog Food, 3kg</span>
                    <img id="landingImage" alt="dog food 3kg bag" src="/images/I/71.jpg">
                </body></html>"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = DetailClient::new(&make_test_config(10)).unwrap();
        let url = format!("{}/dp/B07DOGF00D", mock_server.uri());

        let listing = client.fetch_listing(&url).await.unwrap();
        assert_eq!(listing.title, "Drools Adult Dog Food, 3kg");
    }

    #[tokio::test]
    async fn test_fetch_page_status_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = DetailClient::new(&make_test_config(10)).unwrap();
        let err = client.fetch_page(&format!("{}/dp/NOTAPRODUC", mock_server.uri())).await;

        match err {
            Err(FetchError::Status(code)) => assert_eq!(code, 404),
            other => panic!("expected status error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_retried_then_dropped() {
        // Nothing listens on port 9 (discard) on test hosts
        let client = DetailClient::new(&make_test_config(10)).unwrap();
        assert!(client.fetch_listing("http://127.0.0.1:9/dp/B0CQYFPSCS").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_body_yields_placeholder_listing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&mock_server)
            .await;

        let client = DetailClient::new(&make_test_config(10)).unwrap();
        let url = format!("{}/dp/B0CQYFPSCS", mock_server.uri());

        let listing = client.fetch_listing(&url).await.unwrap();
        assert_eq!(listing, Listing::placeholder(url));
    }
}
