use crate::url::ExclusionSet;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Shared state of a single crawl
///
/// One `CrawlState` exists per crawl invocation and is shared by reference
/// across every task spawned within it. Tasks can only reach the underlying
/// containers through [`try_claim`](Self::try_claim),
/// [`record_links`](Self::record_links) and [`merge`](Self::merge), which are
/// each a single atomic step. Both containers are sharded, so contention is
/// per URL and per word rather than crawl-wide.
#[derive(Debug, Default)]
pub struct CrawlState {
    visited: DashMap<String, VisitRecord>,
    word_counts: DashMap<String, u64>,
    exclusions: ExclusionSet,
}

/// What the crawl knows about one claimed URL
#[derive(Debug, Clone)]
struct VisitRecord {
    /// Largest remaining depth any task has reached this URL with
    best_depth: u32,
    /// Links of the page once its parse has finished; empty if it failed
    links: Option<Arc<[String]>>,
}

/// Outcome of [`CrawlState::try_claim`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// First arrival: the caller parses the page
    First,
    /// Arrived with more depth than any earlier task. Carries the page's
    /// links when its parse has already finished; otherwise the claiming
    /// task picks up the new depth when it records the links.
    Deeper(Option<Arc<[String]>>),
    /// An earlier arrival had at least as much depth left
    Covered,
}

/// Final view of a crawl state, taken once all tasks are quiescent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSnapshot {
    pub visited: HashSet<String>,
    pub word_counts: HashMap<String, u64>,
}

impl CrawlState {
    /// Creates an empty state using the given exclusion patterns
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self {
            visited: DashMap::new(),
            word_counts: DashMap::new(),
            exclusions,
        }
    }

    /// Returns true if the URL fully matches an exclusion pattern
    pub fn is_excluded(&self, url: &str) -> bool {
        self.exclusions.matches(url)
    }

    /// Atomically claims a URL, or raises its best remaining depth
    ///
    /// [`Claim::First`] is returned exactly once per URL for the lifetime of
    /// the state. Later arrivals get [`Claim::Deeper`] only when they bring
    /// strictly more remaining depth than every arrival before them.
    pub fn try_claim(&self, url: &str, remaining_depth: u32) -> Claim {
        let claim = match self.visited.entry(url.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(VisitRecord {
                    best_depth: remaining_depth,
                    links: None,
                });
                Claim::First
            }
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                if remaining_depth > record.best_depth {
                    record.best_depth = remaining_depth;
                    Claim::Deeper(record.links.clone())
                } else {
                    Claim::Covered
                }
            }
        };
        tracing::trace!("Claim {} at depth {} -> {:?}", url, remaining_depth, claim);
        claim
    }

    /// Stores the links of a claimed page and returns its best remaining depth
    ///
    /// The returned depth includes every [`Claim::Deeper`] that arrived while
    /// the page was being parsed, so the claiming task fans out with it.
    pub fn record_links(&self, url: &str, links: Arc<[String]>) -> u32 {
        match self.visited.get_mut(url) {
            Some(mut record) => {
                record.links = Some(links);
                record.best_depth
            }
            None => 0,
        }
    }

    /// Adds a page's word counts into the crawl-wide totals
    ///
    /// Each key is updated under its shard's write lock, so concurrent merges
    /// of the same word never lose an update.
    pub fn merge<'a, I>(&self, counts: I)
    where
        I: IntoIterator<Item = (&'a String, &'a u64)>,
    {
        for (word, count) in counts {
            *self.word_counts.entry(word.clone()).or_insert(0) += *count;
        }
    }

    /// Returns whether the URL has been claimed
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains_key(url)
    }

    /// Number of URLs claimed so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Copies the visited set and word counts out of the state
    ///
    /// Callers must only do this once every task sharing the state is done;
    /// a snapshot taken mid-crawl is not a consistent cut.
    pub fn snapshot(&self) -> CrawlSnapshot {
        CrawlSnapshot {
            visited: self.visited.iter().map(|entry| entry.key().clone()).collect(),
            word_counts: self
                .word_counts
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }
}
