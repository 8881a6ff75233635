use crate::config::types::{Config, CrawlerConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_start_pages(&config.crawler.start_pages)?;
    validate_patterns("ignored-urls", &config.crawler.ignored_urls)?;
    validate_patterns("ignored-words", &config.crawler.ignored_words)?;
    Ok(())
}

/// Validates crawler limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if let Some(parallelism) = config.parallelism {
        if parallelism < 1 {
            return Err(ConfigError::Validation(format!(
                "parallelism must be >= 1, got {}",
                parallelism
            )));
        }
    }

    if config.parse_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "parse-timeout-ms must be > 0 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates seed URLs
fn validate_start_pages(seeds: &[String]) -> Result<(), ConfigError> {
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "start-pages must contain at least one URL".to_string(),
        ));
    }

    for seed in seeds {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if !matches!(url.scheme(), "http" | "https" | "file") {
            return Err(ConfigError::InvalidUrl(format!(
                "Seed URL '{}' must use http, https or file scheme",
                seed
            )));
        }
    }

    Ok(())
}

/// Validates that every pattern compiles as a regular expression
fn validate_patterns(field: &str, patterns: &[String]) -> Result<(), ConfigError> {
    for pattern in patterns {
        if pattern.is_empty() {
            return Err(ConfigError::InvalidPattern(format!(
                "{} contains an empty pattern",
                field
            )));
        }

        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("{} pattern '{}': {}", field, pattern, e))
        })?;
    }
    Ok(())
}
