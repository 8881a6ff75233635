//! Crawler module: the concurrent crawl engine and its page parser
//!
//! This module contains:
//! - `CrawlCoordinator`: launches one task per seed and assembles the result
//! - `CrawlTask`: the recursive, self-limiting unit of work
//! - `PageParser`: the contract for turning a URL into links and word counts
//! - `HtmlPageParser`: the HTTP(S)/file + HTML implementation of that contract

mod coordinator;
mod fetcher;
mod parser;
mod task;

pub use coordinator::{CrawlCoordinator, CrawlSettings, WebCrawler};
pub use fetcher::{build_http_client, fetch_document};
pub use parser::{parse_html, HtmlPageParser, PageParser, ParsedPage};
pub use task::CrawlTask;
