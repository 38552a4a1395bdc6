//! Hostcrawl main entry point
//!
//! This is the command-line interface for the hostcrawl same-host crawler.

use anyhow::Context;
use clap::Parser;
use hostcrawl::config::{load_effective_config, Config, ConfigSource, LogFormat, LogOutput, LoggingConfig};
use hostcrawl::output::{format_response, print_statistics};
use hostcrawl::{crawl_timeout_from_secs, scrap_links, Crawler};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Hostcrawl: a concurrent same-host link crawler
///
/// Hostcrawl visits every page reachable from a start URL without leaving
/// its host, printing the new links found on each page. It stops when no
/// links are left, when the timeout elapses, or on Ctrl-C.
#[derive(Parser, Debug)]
#[command(name = "hostcrawl")]
#[command(version)]
#[command(about = "A concurrent same-host link crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Stop crawling after this many seconds (0 = no limit)
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    timeout: i64,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "hostcrawl.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl to completion, then print every link found
    #[arg(long, conflicts_with_all = ["scrape", "dry_run"])]
    fetch: bool,

    /// Print the links of the start page only, without crawling
    #[arg(long, conflicts_with_all = ["fetch", "dry_run"])]
    scrape: bool,

    /// Show the effective configuration without crawling
    #[arg(long, conflicts_with_all = ["fetch", "scrape"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, source) = load_effective_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    setup_logging(&config.logging, cli.verbose, cli.quiet)?;

    match &source {
        ConfigSource::File { path, hash } => {
            tracing::info!(
                "Configuration loaded from {} (hash: {})",
                path.display(),
                hash
            );
        }
        ConfigSource::Defaults => {
            tracing::info!(
                "No configuration file at {}, using defaults",
                cli.config.display()
            );
        }
    }

    let timeout = crawl_timeout_from_secs(cli.timeout)?;

    if cli.dry_run {
        handle_dry_run(&cli.url, timeout, &config, &source);
    } else if cli.scrape {
        handle_scrape(&cli.url, &config).await?;
    } else if cli.fetch {
        handle_fetch(&cli.url, timeout, config).await?;
    } else {
        handle_stream(&cli.url, timeout, config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber from configuration and verbosity
fn setup_logging(logging: &LoggingConfig, verbose: u8, quiet: bool) -> anyhow::Result<()> {
    if !logging.enabled {
        return Ok(());
    }

    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::new(format!("hostcrawl={},warn", level));

    match logging.output {
        LogOutput::Stdout => init_subscriber(filter, logging.format, std::io::stdout),
        LogOutput::Stderr => init_subscriber(filter, logging.format, std::io::stderr),
        LogOutput::File => {
            let path = logging.file.as_deref().unwrap_or_default();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            init_subscriber(filter, logging.format, Mutex::new(file));
        }
    }

    Ok(())
}

fn init_subscriber<W>(filter: EnvFilter, format: LogFormat, writer: W)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(url: &str, timeout: Duration, config: &Config, source: &ConfigSource) {
    println!("=== Hostcrawl Dry Run ===\n");

    match source {
        ConfigSource::File { path, hash } => {
            println!("Configuration: {} (hash: {})", path.display(), hash)
        }
        ConfigSource::Defaults => println!("Configuration: built-in defaults"),
    }

    println!("\nCrawl:");
    println!("  Start URL: {}", url);
    if timeout.is_zero() {
        println!("  Timeout: none");
    } else {
        println!("  Timeout: {}s", timeout.as_secs());
    }

    println!("\nRequests:");
    println!("  Timeout: {}s", config.requests.timeout);
    println!("  Retries: {}", config.requests.retries);
    if config.requests.max_concurrent == 0 {
        println!("  Max concurrent: unbounded");
    } else {
        println!("  Max concurrent: {}", config.requests.max_concurrent);
    }
    println!("  User agent: {}", config.requests.user_agent);
    println!(
        "  Progress interval: {}ms",
        config.requests.progress_interval
    );

    println!("\nLogging:");
    println!("  Enabled: {}", config.logging.enabled);
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);
    match &config.logging.file {
        Some(file) if config.logging.output == LogOutput::File => {
            println!("  Output: {} ({})", config.logging.output, file)
        }
        _ => println!("  Output: {}", config.logging.output),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --scrape mode: prints the links of a single page
async fn handle_scrape(url: &str, config: &Config) -> anyhow::Result<()> {
    let response = scrap_links(&config.requests, url)
        .await
        .with_context(|| format!("Failed to scrape {}", url))?;

    if let Some(error) = &response.error {
        tracing::warn!("{}", error);
    }

    for link in &response.links {
        println!("{}", link);
    }

    Ok(())
}

/// Handles the --fetch mode: crawls to completion and prints every link
async fn handle_fetch(url: &str, timeout: Duration, config: Config) -> anyhow::Result<()> {
    let crawler = Crawler::new(config.requests)?;
    let results = crawler.fetch_links(url, timeout).await?;

    for link in results.links() {
        println!("{}", link);
    }

    if let Some(stats) = results.stats() {
        println!();
        print_statistics(stats);
    }

    Ok(())
}

/// Handles the default mode: prints each page's new links as they arrive
async fn handle_stream(url: &str, timeout: Duration, config: Config) -> anyhow::Result<()> {
    let crawler = Crawler::new(config.requests)?;
    let mut results = crawler.stream_links(url, timeout)?;

    while let Some(response) = results.next().await {
        println!("{}", format_response(&response));
    }

    let stats = results.wait().await;
    println!();
    print_statistics(&stats);

    Ok(())
}
