//! Ripple-Tally: a deadline-bounded concurrent word-frequency crawler
//!
//! This crate crawls a web graph outward from a set of seed URLs, up to a
//! maximum depth and before a deadline, and tallies how often every word
//! appears across the pages it visits. URLs matching configured exclusion
//! patterns are never visited.

pub mod config;
pub mod crawler;
pub mod output;
pub mod profiler;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-Tally operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl task for {url} failed: {message}")]
    TaskFailed { url: String, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Recoverable failure to parse a single page
///
/// A crawl never aborts on one of these; the page simply contributes no
/// links and no words.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Unsupported URL scheme for {url}")]
    UnsupportedScheme { url: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Parse of {url} timed out")]
    Timeout { url: String },

    #[error("IO error reading {url}: {source}")]
    Io { url: String, source: std::io::Error },
}

/// Result type alias for single-page parse operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlCoordinator, HtmlPageParser, PageParser, ParsedPage, WebCrawler};
pub use output::CrawlResult;
pub use profiler::{ProfiledCrawler, Profiler};
pub use state::CrawlState;
pub use url::ExclusionSet;
