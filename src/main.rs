//! Onion-Ripple main entry point
//!
//! This is the command-line interface for the Onion-Ripple crawler.

use anyhow::Context;
use clap::Parser;
use onion_ripple::config::{load_config_with_hash, Config};
use onion_ripple::crawler::run_crawl;
use onion_ripple::proxy::{is_reachable, wait_for_proxy, CONNECT_TIMEOUT};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Onion-Ripple: a bounded, polite crawler for onion services
///
/// Onion-Ripple fetches pages through a Tor SOCKS proxy, stays inside each
/// seed's domain, and appends a title, snippet and link list for every page
/// to a JSON-lines file or SQLite database.
#[derive(Parser, Debug)]
#[command(name = "onion-ripple")]
#[command(version)]
#[command(about = "A bounded, polite crawler for onion services", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "check_proxy")]
    dry_run: bool,

    /// Wait for the SOCKS proxy as a crawl would, then exit
    #[arg(long, conflicts_with = "dry_run")]
    check_proxy: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config).await;
        Ok(())
    } else if cli.check_proxy {
        handle_check_proxy(&config).await
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("onion_ripple=info,warn"),
            1 => EnvFilter::new("onion_ripple=debug,info"),
            2 => EnvFilter::new("onion_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
async fn handle_dry_run(config: &Config) {
    println!("=== Onion-Ripple Dry Run ===\n");

    println!("Proxy:");
    println!("  SOCKS: {}", config.proxy.socks_url());
    println!(
        "  Wait: up to {}s, polling every {}s",
        config.proxy.wait_timeout, config.proxy.poll_interval
    );
    let reachable = is_reachable(&config.proxy.address(), CONNECT_TIMEOUT).await;
    println!("  Reachable now: {}", if reachable { "yes" } else { "no" });

    println!("\nIdentity rotation:");
    match &config.control {
        Some(control) => {
            println!("  Control port: {}", control.address());
            println!(
                "  New identity every {} fetch(es), settle {}s",
                control.rotate_after_requests, control.settle_time
            );
        }
        None => println!("  Disabled"),
    }

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.request_timeout);
    println!("  Attempts: {}", config.fetch.max_retries);
    println!("  Max body: {} bytes", config.fetch.max_content_bytes);
    println!("  Host policy: {:?}", config.fetch.host_policy());
    println!(
        "  Delay: {}s +/- {}s",
        config.rate_limit.base, config.rate_limit.jitter
    );

    println!("\nCrawler:");
    println!("  Pages per domain: {}", config.crawler.max_pages_per_domain);
    println!("  Link filter: {:?}", config.crawler.link_suffix_filter);
    println!("  Snippet tags: {}", config.crawler.snippet_tags.join(", "));

    println!("\nOutput:");
    println!("  {:?} at {}", config.output.format, config.output.path);

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --check-proxy mode: runs only the proxy wait
async fn handle_check_proxy(config: &Config) -> anyhow::Result<()> {
    let proxy = &config.proxy;
    match wait_for_proxy(&proxy.address(), proxy.poll_interval(), proxy.wait_timeout()).await {
        Ok(waited) => {
            println!("✓ Proxy at {} is reachable (waited {:?})", proxy.address(), waited);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, output: {:?} at {}",
        config.crawler.seeds.len(),
        config.output.format,
        config.output.path
    );

    match run_crawl(config).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed: {} page(s) stored of {} attempted ({:.1}%)",
                summary.pages_stored,
                summary.pages_attempted,
                summary.success_rate()
            );
            for (domain, visits) in &summary.visits_by_domain {
                tracing::info!("  {}: {} visit(s)", domain, visits);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
