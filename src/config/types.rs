use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Ripple-Tally
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of hops to follow from each seed URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Wall-clock budget for the whole crawl (seconds)
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,

    /// Maximum number of pages parsed at once; defaults to the number of cores
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// Number of most popular words kept in the crawl result
    #[serde(rename = "popular-word-count", default = "default_popular_word_count")]
    pub popular_word_count: usize,

    /// Optional upper bound on a single page parse (milliseconds)
    #[serde(rename = "parse-timeout-ms", default)]
    pub parse_timeout_ms: Option<u64>,

    /// Seed URLs the crawl starts from
    #[serde(rename = "start-pages", default)]
    pub start_pages: Vec<String>,

    /// URL patterns that are never visited (full-match regular expressions)
    #[serde(rename = "ignored-urls", default)]
    pub ignored_urls: Vec<String>,

    /// Word patterns that are never counted (full-match regular expressions)
    #[serde(rename = "ignored-words", default)]
    pub ignored_words: Vec<String>,
}

impl CrawlerConfig {
    /// Returns the crawl timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Returns the per-page parse timeout, if one is configured
    pub fn parse_timeout(&self) -> Option<Duration> {
        self.parse_timeout_ms.map(Duration::from_millis)
    }

    /// Returns the effective parallelism, falling back to the core count
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

fn default_popular_word_count() -> usize {
    10
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON crawl result; empty writes to stdout
    #[serde(rename = "result-path", default)]
    pub result_path: String,

    /// Path of the profiling report; empty writes to stdout
    #[serde(rename = "profile-output-path", default)]
    pub profile_output_path: String,
}
