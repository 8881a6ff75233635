//! URL handling module for Ripple-Tally
//!
//! This module provides exclusion-pattern matching for candidate URLs and
//! resolution of links discovered on a page into absolute, crawlable URLs.

mod matcher;
mod normalize;

// Re-export main types and functions
pub use matcher::ExclusionSet;
pub use normalize::{is_crawlable_scheme, resolve_link};
