//! amz-harvest - Amazon search listing harvester
//!
//! Collects product links from browser-rendered search results, scrapes each
//! detail page concurrently, and writes a CSV.

use amz_harvest::amazon::regions::Region;
use amz_harvest::commands::HarvestCommand;
use amz_harvest::config::Config;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-harvest",
    version,
    about = "Harvest Amazon search listings into a CSV",
    long_about = "Discovers product links from browser-rendered Amazon search results, \
                  scrapes each detail page over HTTP with a bounded worker pool, \
                  and writes Title, URL, Price, Rating, Reviews and Availability to CSV."
)]
struct Cli {
    /// Search query (defaults to the configured query)
    query: Option<String>,

    /// Amazon region to search
    #[arg(short, long)]
    region: Option<Region>,

    /// Number of product links to collect
    #[arg(short = 'n', long)]
    max: Option<usize>,

    /// Concurrent detail page fetches
    #[arg(short, long)]
    workers: Option<usize>,

    /// Path to the chromedriver executable
    #[arg(long, env = "AMZ_DRIVER")]
    driver: Option<PathBuf>,

    /// CSV output path
    #[arg(short, long, env = "AMZ_OUTPUT")]
    output: Option<PathBuf>,

    /// Proxy URL for detail requests (e.g., socks5://host:port)
    #[arg(long, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Base delay between search pages in milliseconds
    #[arg(long, env = "AMZ_DELAY")]
    delay: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(query) = cli.query {
        config.query = query;
    }
    if let Some(region) = cli.region {
        config.region = region;
    }
    if let Some(max) = cli.max {
        config.target = max;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(driver) = cli.driver {
        config.driver_path = driver;
    }
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if cli.headed {
        config.headless = false;
    }

    let summary = HarvestCommand::new(config).execute().await?;
    println!(
        "Saved {} of {} products to {}",
        summary.listings,
        summary.links,
        summary.output.display()
    );

    Ok(())
}
