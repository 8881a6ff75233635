//! Output module for crawl results
//!
//! This module handles:
//! - The immutable `CrawlResult` produced at the end of a crawl
//! - Ranking words by popularity
//! - Writing results as JSON to a file or any writer

mod result;
mod writer;

pub use result::{rank_words, CrawlResult};
pub use writer::{write_result, write_result_to};

use thiserror::Error;

/// Errors that can occur while writing results
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize result: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
