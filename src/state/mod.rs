//! State module for crawl-scoped shared state
//!
//! # Components
//!
//! - `CrawlState`: the visited-URL records and word-count accumulator shared
//!   by every task of one crawl, plus the read-only exclusion patterns
//! - `Claim`: what a task may do with a URL it has reached

mod crawl_state;

// Re-export main types
pub use crawl_state::{Claim, CrawlSnapshot, CrawlState};
