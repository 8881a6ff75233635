//! Ripple-Tally main entry point
//!
//! This is the command-line interface for the Ripple-Tally word-frequency crawler.

use anyhow::Context;
use clap::Parser;
use ripple_tally::config::{load_config_with_hash, Config};
use ripple_tally::crawler::{CrawlCoordinator, HtmlPageParser, WebCrawler};
use ripple_tally::output::{write_result, write_result_to};
use ripple_tally::profiler::Profiler;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Ripple-Tally: a deadline-bounded concurrent word-frequency crawler
///
/// Ripple-Tally crawls outward from the configured start pages up to a
/// maximum depth and before a deadline, skipping excluded URLs, and reports
/// the most popular words across every page it visited.
#[derive(Parser, Debug)]
#[command(name = "ripple-tally")]
#[command(version)]
#[command(about = "A deadline-bounded concurrent word-frequency crawler", long_about = None)]
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
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.crawler.effective_parallelism())
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(handle_crawl(config, config_hash))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_tally=info,warn"),
            1 => EnvFilter::new("ripple_tally=debug,info"),
            2 => EnvFilter::new("ripple_tally=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so JSON results on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;

    println!("=== Ripple-Tally Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Timeout: {}s", crawler.timeout_seconds);
    println!("  Parallelism: {}", crawler.effective_parallelism());
    println!("  Popular words reported: {}", crawler.popular_word_count);
    match crawler.parse_timeout_ms {
        Some(ms) => println!("  Parse timeout: {}ms", ms),
        None => println!("  Parse timeout: none"),
    }

    println!("\nStart Pages ({}):", crawler.start_pages.len());
    for seed in &crawler.start_pages {
        println!("  - {}", seed);
    }

    println!("\nIgnored URL Patterns ({}):", crawler.ignored_urls.len());
    for pattern in &crawler.ignored_urls {
        println!("  - {}", pattern);
    }

    println!("\nIgnored Word Patterns ({}):", crawler.ignored_words.len());
    for pattern in &crawler.ignored_words {
        println!("  - {}", pattern);
    }

    println!("\nOutput:");
    println!("  Result: {}", display_target(&config.output.result_path));
    println!(
        "  Profile: {}",
        display_target(&config.output.profile_output_path)
    );

    println!("\n✓ Configuration is valid");
}

fn display_target(path: &str) -> &str {
    if path.trim().is_empty() {
        "<stdout>"
    } else {
        path
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let profiler = Profiler::new().with_note(format!("Config sha256 {}", config_hash));

    let parser = HtmlPageParser::from_config(&config.crawler)?;
    let coordinator = CrawlCoordinator::from_config(parser, &config.crawler)?;
    let crawler = profiler.wrap(coordinator);

    let result = match crawler.crawl(&config.crawler.start_pages).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let result_path = config.output.result_path.trim();
    if result_path.is_empty() {
        let mut stdout = std::io::stdout().lock();
        write_result_to(&result, &mut stdout)?;
        stdout.flush()?;
    } else {
        write_result(&result, Path::new(result_path))
            .with_context(|| format!("Failed to write result to {}", result_path))?;
        tracing::info!("Crawl result written to: {}", result_path);
    }

    let profile_path = config.output.profile_output_path.trim();
    if profile_path.is_empty() {
        let mut stdout = std::io::stdout().lock();
        profiler.write_data_to(&mut stdout)?;
        stdout.flush()?;
    } else {
        profiler
            .write_data(Path::new(profile_path))
            .with_context(|| format!("Failed to write profile to {}", profile_path))?;
        tracing::info!("Profile written to: {}", profile_path);
    }

    Ok(())
}
