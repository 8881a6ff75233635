use crate::state::CrawlSnapshot;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Final, immutable outcome of one crawl
///
/// Serializes as `{"wordCounts": {...}, "urlsVisited": n}`, where
/// `wordCounts` holds only the popular words, most popular first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    /// Every word counted, with its crawl-wide total
    pub word_counts: HashMap<String, u64>,

    /// The top words by [`rank_words`] order
    pub popular_words: Vec<(String, u64)>,

    /// URLs that were claimed for processing
    pub visited: BTreeSet<String>,

    /// Number of URLs claimed for processing
    pub urls_visited: usize,
}

impl CrawlResult {
    /// Builds a result from a quiescent crawl state
    pub fn from_snapshot(snapshot: CrawlSnapshot, popular_word_count: usize) -> Self {
        let popular_words = rank_words(&snapshot.word_counts, popular_word_count);
        let visited: BTreeSet<String> = snapshot.visited.into_iter().collect();

        Self {
            word_counts: snapshot.word_counts,
            popular_words,
            urls_visited: visited.len(),
            visited,
        }
    }

    /// Result of a crawl that visited nothing
    pub fn empty() -> Self {
        Self::from_snapshot(CrawlSnapshot::default(), 0)
    }
}

/// Returns the `limit` most popular words
///
/// Ordered by count (highest first), then by word length (longest first),
/// then alphabetically, so the ranking is total and deterministic.
///
/// # Examples
///
/// ```
/// use ripple_tally::output::rank_words;
/// use std::collections::HashMap;
///
/// let counts = HashMap::from([
///     ("a".to_string(), 2),
///     ("bb".to_string(), 2),
///     ("c".to_string(), 5),
/// ]);
/// let ranked = rank_words(&counts, 2);
/// assert_eq!(ranked, vec![("c".to_string(), 5), ("bb".to_string(), 2)]);
/// ```
pub fn rank_words(counts: &HashMap<String, u64>, limit: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = counts
        .iter()
        .map(|(word, count)| (word.clone(), *count))
        .collect();

    ranked.sort_by(|(a, a_count), (b, b_count)| {
        (Reverse(*a_count), Reverse(a.len()), a).cmp(&(Reverse(*b_count), Reverse(b.len()), b))
    });
    ranked.truncate(limit);
    ranked
}

/// Serializes ranked pairs as a JSON object, keeping rank order
struct RankedMap<'a>(&'a [(String, u64)]);

impl Serialize for RankedMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (word, count) in self.0 {
            map.serialize_entry(word, count)?;
        }
        map.end()
    }
}

impl Serialize for CrawlResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CrawlResult", 2)?;
        state.serialize_field("wordCounts", &RankedMap(&self.popular_words))?;
        state.serialize_field("urlsVisited", &self.urls_visited)?;
        state.end()
    }
}
