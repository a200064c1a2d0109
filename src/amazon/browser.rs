//! Browser-rendered page loading over WebDriver.
//!
//! Search result pages are assembled client-side, so link discovery drives a
//! real Chrome through a locally spawned chromedriver.

use crate::amazon::agents::random_user_agent;
use crate::amazon::selectors::search::PRODUCT_LINK_CSS;
use crate::config::Config;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

const CONNECT_ATTEMPTS: u32 = 20;
const CONNECT_INTERVAL: Duration = Duration::from_millis(250);

/// Renders a search results page and returns its final HTML.
///
/// Implemented by [`BrowserSession`]; tests substitute canned pages.
#[async_trait]
pub trait SearchRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<String>;
}

/// A running chromedriver process with one WebDriver session attached.
pub struct BrowserSession {
    client: Client,
    driver: Child,
    page_wait: Duration,
}

impl BrowserSession {
    /// Spawns the driver executable and opens a headless Chrome session.
    pub async fn launch(config: &Config) -> Result<Self> {
        info!("Starting WebDriver: {}", config.driver_path.display());

        let mut driver = Command::new(&config.driver_path)
            .arg(format!("--port={}", config.driver_port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| {
                format!("Failed to start WebDriver at {}", config.driver_path.display())
            })?;

        let webdriver_url = format!("http://localhost:{}", config.driver_port);
        let client = match Self::connect(&webdriver_url, chrome_capabilities(config)).await {
            Ok(client) => client,
            Err(e) => {
                let _ = driver.kill().await;
                return Err(e);
            }
        };

        info!("Browser session ready");
        Ok(Self { client, driver, page_wait: config.page_wait() })
    }

    /// Connects to the driver, retrying while it is still starting up.
    async fn connect(webdriver_url: &str, capabilities: Capabilities) -> Result<Client> {
        let mut attempt = 1;
        loop {
            let mut builder = ClientBuilder::native();
            builder.capabilities(capabilities.clone());

            match builder.connect(webdriver_url).await {
                Ok(client) => return Ok(client),
                Err(e) if attempt < CONNECT_ATTEMPTS => {
                    debug!("WebDriver not ready (attempt {}): {}", attempt, e);
                    attempt += 1;
                    tokio::time::sleep(CONNECT_INTERVAL).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to connect to WebDriver at {}", webdriver_url)
                    })
                }
            }
        }
    }

    /// Ends the browser session and stops the driver process.
    pub async fn close(mut self) -> Result<()> {
        info!("Closing browser session");
        if let Err(e) = self.client.close().await {
            warn!("Failed to close WebDriver session cleanly: {}", e);
        }
        self.driver.kill().await.context("Failed to stop WebDriver process")
    }
}

#[async_trait]
impl SearchRenderer for BrowserSession {
    async fn render(&self, url: &str) -> Result<String> {
        self.client.goto(url).await.with_context(|| format!("Failed to open {}", url))?;

        self.client
            .wait()
            .at_most(self.page_wait)
            .for_element(Locator::Css(PRODUCT_LINK_CSS))
            .await
            .with_context(|| format!("Search results did not render within {:?}", self.page_wait))?;

        self.client.source().await.context("Failed to read page source")
    }
}

/// Chrome options mirroring a regular desktop window.
fn chrome_capabilities(config: &Config) -> Capabilities {
    let mut args = vec![
        "--window-size=1920,1080".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        format!("--user-agent={}", random_user_agent()),
    ];
    if config.headless {
        args.insert(0, "--headless=new".to_string());
    }

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}
