//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::amazon::regions::Region;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Amazon storefront
    #[serde(default)]
    pub region: Region,

    /// Overrides the storefront base URL (e.g. a local mirror)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Search query
    #[serde(default = "default_query")]
    pub query: String,

    /// Number of product links to collect
    #[serde(default = "default_target")]
    pub target: usize,

    /// Upper bound on search pages visited
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Concurrent detail fetches
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Path to the WebDriver executable (chromedriver)
    #[serde(default = "default_driver_path")]
    pub driver_path: PathBuf,

    /// Port the WebDriver executable listens on
    #[serde(default = "default_driver_port")]
    pub driver_port: u16,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Seconds to wait for search results to render
    #[serde(default = "default_page_wait_secs")]
    pub page_wait_secs: u64,

    /// Base delay between search pages in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Random jitter added to delay (0 to this value)
    #[serde(default = "default_delay_jitter_ms")]
    pub delay_jitter_ms: u64,

    /// Per-request timeout for detail pages
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Attempts per detail page before it is dropped
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry backoff in milliseconds; doubles on each attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Proxy URL for detail requests (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// CSV output path, overwritten on each run
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_query() -> String {
    "smartphone".to_string()
}

fn default_target() -> usize {
    100
}

fn default_max_pages() -> u32 {
    20
}

fn default_workers() -> usize {
    50
}

fn default_driver_path() -> PathBuf {
    PathBuf::from("chromedriver")
}

fn default_driver_port() -> u16 {
    9515
}

fn default_headless() -> bool {
    true
}

fn default_page_wait_secs() -> u64 {
    10
}

fn default_delay_ms() -> u64 {
    1000
}

fn default_delay_jitter_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_output() -> PathBuf {
    PathBuf::from("amazon_scraped_data.csv")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: Region::In,
            base_url: None,
            query: default_query(),
            target: default_target(),
            max_pages: default_max_pages(),
            workers: default_workers(),
            driver_path: default_driver_path(),
            driver_port: default_driver_port(),
            headless: default_headless(),
            page_wait_secs: default_page_wait_secs(),
            delay_ms: default_delay_ms(),
            delay_jitter_ms: default_delay_jitter_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            proxy: None,
            output: default_output(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("amz-harvest").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides. Unparseable values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(region) = std::env::var("AMZ_REGION") {
            if let Ok(r) = region.parse() {
                self.region = r;
            }
        }

        if let Ok(proxy) = std::env::var("AMZ_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(delay) = std::env::var("AMZ_DELAY") {
            if let Ok(d) = delay.parse() {
                self.delay_ms = d;
            }
        }

        if let Ok(driver) = std::env::var("AMZ_DRIVER") {
            self.driver_path = PathBuf::from(driver);
        }

        if let Ok(output) = std::env::var("AMZ_OUTPUT") {
            self.output = PathBuf::from(output);
        }

        self
    }

    /// Storefront root that search and detail URLs are built on.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.region.base_url(),
        }
    }

    pub fn page_wait(&self) -> Duration {
        Duration::from_secs(self.page_wait_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Env vars are process-global
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.region, Region::In);
        assert_eq!(config.query, "smartphone");
        assert_eq!(config.target, 100);
        assert_eq!(config.workers, 50);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_backoff_ms, 1000);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.delay_ms, 1000);
        assert_eq!(config.delay_jitter_ms, 2000);
        assert_eq!(config.output, PathBuf::from("amazon_scraped_data.csv"));
        assert!(config.headless);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_base_url() {
        let mut config = Config::default();
        assert_eq!(config.base_url(), "https://www.amazon.in");

        config.region = Region::Uk;
        assert_eq!(config.base_url(), "https://www.amazon.co.uk");

        config.base_url = Some("http://127.0.0.1:4000/".to_string());
        assert_eq!(config.base_url(), "http://127.0.0.1:4000");
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            region = "us"
            query = "laptop"
            target = 25
            workers = 8
            driver_path = "/opt/chromedriver"
            "#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.region, Region::Us);
        assert_eq!(config.query, "laptop");
        assert_eq!(config.target, 25);
        assert_eq!(config.workers, 8);
        assert_eq!(config.driver_path, PathBuf::from("/opt/chromedriver"));
        // Unset fields keep their defaults
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.output, PathBuf::from("amazon_scraped_data.csv"));
    }

    #[test]
    fn test_config_from_file_not_found() {
        let result = Config::from_file("/nonexistent/path/config.toml");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_config_from_file_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml {{{{").unwrap();

        let err = Config::from_file(file.path()).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "max_pages = 3").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.region, Region::In);
    }

    #[test]
    fn test_config_with_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        let vars = ["AMZ_REGION", "AMZ_PROXY", "AMZ_DELAY", "AMZ_DRIVER", "AMZ_OUTPUT"];
        let saved: Vec<_> = vars.iter().map(|v| std::env::var(v).ok()).collect();

        std::env::set_var("AMZ_REGION", "de");
        std::env::set_var("AMZ_PROXY", "http://proxy:8080");
        std::env::set_var("AMZ_DELAY", "5000");
        std::env::set_var("AMZ_DRIVER", "/usr/local/bin/chromedriver");
        std::env::set_var("AMZ_OUTPUT", "out.csv");

        let config = Config::new().with_env();
        assert_eq!(config.region, Region::De);
        assert_eq!(config.proxy, Some("http://proxy:8080".to_string()));
        assert_eq!(config.delay_ms, 5000);
        assert_eq!(config.driver_path, PathBuf::from("/usr/local/bin/chromedriver"));
        assert_eq!(config.output, PathBuf::from("out.csv"));

        for (var, value) in vars.iter().zip(saved) {
            match value {
                Some(v) => std::env::set_var(var, v),
                None => std::env::remove_var(var),
            }
        }
    }

    #[test]
    fn test_config_with_env_invalid_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        let orig_region = std::env::var("AMZ_REGION").ok();
        let orig_delay = std::env::var("AMZ_DELAY").ok();

        std::env::set_var("AMZ_REGION", "invalid_region");
        std::env::set_var("AMZ_DELAY", "not_a_number");

        let config = Config::new().with_env();
        assert_eq!(config.region, Region::In);
        assert_eq!(config.delay_ms, 1000);

        match orig_region {
            Some(v) => std::env::set_var("AMZ_REGION", v),
            None => std::env::remove_var("AMZ_REGION"),
        }
        match orig_delay {
            Some(v) => std::env::set_var("AMZ_DELAY", v),
            None => std::env::remove_var("AMZ_DELAY"),
        }
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            region: Region::Uk,
            proxy: Some("socks5://localhost:1080".to_string()),
            target: 40,
            headless: false,
            ..Config::default()
        };

        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.region, config.region);
        assert_eq!(parsed.proxy, config.proxy);
        assert_eq!(parsed.target, 40);
        assert!(!parsed.headless);
        assert_eq!(parsed.output, config.output);
    }
}
