//! Crawler coordinator - crawl orchestration and result assembly
//!
//! This module contains the single crawl entry point. It:
//! - Validates the crawl parameters before any work starts
//! - Creates the crawl-scoped shared state
//! - Launches one root task per seed URL and waits for every task tree
//! - Snapshots the quiescent state into a `CrawlResult`

use crate::config::CrawlerConfig;
use crate::crawler::parser::PageParser;
use crate::crawler::task::{depth_first, join_all, CrawlContext, CrawlTask};
use crate::output::CrawlResult;
use crate::state::CrawlState;
use crate::url::ExclusionSet;
use crate::{ConfigError, CrawlError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Deadline used when `now + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// The one coarse-grained operation a crawler exposes
///
/// Keeping the surface to a single call lets decorators such as
/// [`ProfiledCrawler`](crate::profiler::ProfiledCrawler) wrap any crawler
/// without the crawler knowing.
pub trait WebCrawler: Send + Sync {
    /// Crawls outward from `seeds` and returns the aggregate result
    fn crawl(&self, seeds: &[String]) -> impl Future<Output = Result<CrawlResult, CrawlError>> + Send;

    /// Maximum number of pages parsed at once
    fn max_parallelism(&self) -> usize;
}

/// Parameters of a crawl, independent of where they were loaded from
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Hops to follow from each seed; 0 parses nothing
    pub max_depth: u32,

    /// Time budget measured from the start of `crawl`
    pub timeout: Duration,

    /// Parse calls allowed in flight; 1 crawls sequentially, depth-first
    pub parallelism: usize,

    /// Size of the ranked word list in the result
    pub popular_word_count: usize,

    /// Optional bound on a single parse call
    pub parse_timeout: Option<Duration>,

    /// URLs that are never visited
    pub exclusions: ExclusionSet,
}

impl CrawlSettings {
    /// Builds settings from the crawler section of the configuration
    pub fn from_config(config: &CrawlerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            max_depth: config.max_depth,
            timeout: config.timeout(),
            parallelism: config.effective_parallelism(),
            popular_word_count: config.popular_word_count,
            parse_timeout: config.parse_timeout(),
            exclusions: ExclusionSet::new(&config.ignored_urls)?,
        })
    }
}

/// Runs crawls with one page parser and one set of settings
///
/// Every call to [`crawl`](WebCrawler::crawl) gets its own fresh
/// [`CrawlState`]; nothing is shared between two crawls.
pub struct CrawlCoordinator<P> {
    parser: Arc<P>,
    settings: CrawlSettings,
}

impl<P: PageParser> CrawlCoordinator<P> {
    /// Creates a new coordinator
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlCoordinator)` - Settings are usable
    /// * `Err(ConfigError)` - Parallelism is zero
    pub fn new(parser: P, settings: CrawlSettings) -> Result<Self, ConfigError> {
        if settings.parallelism == 0 {
            return Err(ConfigError::Validation(
                "parallelism must be >= 1".to_string(),
            ));
        }

        Ok(Self {
            parser: Arc::new(parser),
            settings,
        })
    }

    /// Creates a coordinator from the crawler section of the configuration
    pub fn from_config(parser: P, config: &CrawlerConfig) -> Result<Self, ConfigError> {
        Self::new(parser, CrawlSettings::from_config(config)?)
    }

    async fn run(&self, seeds: &[String]) -> Result<CrawlResult, CrawlError> {
        if seeds.is_empty() {
            return Err(ConfigError::Validation(
                "crawl needs at least one seed URL".to_string(),
            )
            .into());
        }

        let started = Instant::now();
        let deadline = started
            .checked_add(self.settings.timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let sequential = self.settings.parallelism == 1;

        tracing::info!(
            "Starting crawl of {} seed(s): max depth {}, timeout {:?}, parallelism {}",
            seeds.len(),
            self.settings.max_depth,
            self.settings.timeout,
            self.settings.parallelism
        );

        let ctx = Arc::new(CrawlContext {
            parser: Arc::clone(&self.parser),
            state: CrawlState::new(self.settings.exclusions.clone()),
            permits: Semaphore::new(self.settings.parallelism),
            parse_timeout: self.settings.parse_timeout,
            sequential,
        });

        let roots: Vec<CrawlTask> = seeds
            .iter()
            .map(|seed| CrawlTask::new(seed.clone(), self.settings.max_depth, deadline))
            .collect();

        if sequential {
            depth_first(roots, &ctx).await?;
        } else {
            join_all(roots, &ctx).await?;
        }

        if Instant::now() >= deadline {
            tracing::info!("Crawl deadline reached; result is partial");
        }

        // Every task has completed, so this is a consistent cut
        let result =
            CrawlResult::from_snapshot(ctx.state.snapshot(), self.settings.popular_word_count);

        tracing::info!(
            "Crawl completed: {} URLs visited, {} distinct words in {:?}",
            result.urls_visited,
            result.word_counts.len(),
            started.elapsed()
        );

        Ok(result)
    }
}

impl<P: PageParser> WebCrawler for CrawlCoordinator<P> {
    async fn crawl(&self, seeds: &[String]) -> Result<CrawlResult, CrawlError> {
        self.run(seeds).await
    }

    fn max_parallelism(&self) -> usize {
        self.settings.parallelism
    }
}
