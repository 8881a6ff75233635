//! Call-timing instrumentation
//!
//! A [`Profiler`] measures how long designated operations take and writes the
//! totals to a plain-text report. Crawlers are instrumented by wrapping them
//! in a [`ProfiledCrawler`], which implements [`WebCrawler`] itself, so the
//! wrapped crawler never knows it is being timed.

mod state;

pub use state::ProfilingState;

use crate::crawler::WebCrawler;
use crate::output::CrawlResult;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors that can occur while writing a profile report
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Failed to write profile data: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for profiler operations
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Collects timing records for one program run
///
/// Cloning a profiler is cheap and every clone records into the same state.
#[derive(Debug, Clone)]
pub struct Profiler {
    started_at: DateTime<Utc>,
    note: Option<String>,
    state: Arc<ProfilingState>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            note: None,
            state: Arc::new(ProfilingState::default()),
        }
    }

    /// Adds a line written under the report header, e.g. the config hash
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Wraps a crawler so every `crawl` call is timed
    pub fn wrap<C: WebCrawler>(&self, crawler: C) -> ProfiledCrawler<C> {
        ProfiledCrawler {
            label: format!("{}#crawl", short_type_name::<C>()),
            inner: crawler,
            profiler: self.clone(),
        }
    }

    /// Records one call's elapsed time under `label`
    pub fn record(&self, label: &str, elapsed: std::time::Duration) {
        tracing::debug!("{}", state::format_record(label, elapsed));
        self.state.record(label, elapsed);
    }

    /// Returns the accumulated timing records
    pub fn state(&self) -> &ProfilingState {
        &self.state
    }

    /// Writes the report to the given path, appending if the file exists
    pub fn write_data(&self, path: &Path) -> ProfileResult<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        self.write_data_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Writes the report to any writer
    ///
    /// ```text
    /// Run at Mon, 19 Oct 2026 10:00:00 GMT
    /// CrawlCoordinator#crawl took 0m 7s 12ms
    ///
    /// ```
    pub fn write_data_to<W: Write>(&self, writer: &mut W) -> ProfileResult<()> {
        writeln!(
            writer,
            "Run at {}",
            self.started_at.format("%a, %-d %b %Y %H:%M:%S GMT")
        )?;
        if let Some(note) = &self.note {
            writeln!(writer, "{}", note)?;
        }
        self.state.write(writer)?;
        writeln!(writer)?;
        Ok(())
    }
}

/// A crawler whose `crawl` calls are timed by a [`Profiler`]
pub struct ProfiledCrawler<C> {
    label: String,
    inner: C,
    profiler: Profiler,
}

impl<C> ProfiledCrawler<C> {
    /// Label the timings are recorded under
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<C: WebCrawler> WebCrawler for ProfiledCrawler<C> {
    async fn crawl(&self, seeds: &[String]) -> Result<CrawlResult, CrawlError> {
        let started = Instant::now();
        let result = self.inner.crawl(seeds).await;
        // Failed calls are timed too
        self.profiler.record(&self.label, started.elapsed());
        result
    }

    fn max_parallelism(&self) -> usize {
        self.inner.max_parallelism()
    }
}

/// `crate::a::Thing<crate::b::Other>` -> `Thing`
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
