use crate::ConfigError;
use regex::Regex;

/// A compiled, ordered set of full-match patterns
///
/// Each configured pattern is anchored on both ends when compiled, so a
/// candidate only matches when the *whole* string matches the pattern. A
/// pattern such as `https://example\.com/.*` therefore excludes every page
/// under that site, while `example` alone excludes nothing but the literal
/// string `example`.
///
/// The set is built once before a crawl starts and only read afterwards, so
/// it can be shared between tasks without synchronization.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Regex>,
}

impl ExclusionSet {
    /// Compiles the given patterns into an exclusion set
    ///
    /// # Returns
    ///
    /// * `Ok(ExclusionSet)` - All patterns compiled
    /// * `Err(ConfigError::InvalidPattern)` - The first pattern that failed to compile
    ///
    /// # Examples
    ///
    /// ```
    /// use ripple_tally::url::ExclusionSet;
    ///
    /// let set = ExclusionSet::new(&["https://example\\.com/private/.*"]).unwrap();
    /// assert!(set.matches("https://example.com/private/a"));
    /// assert!(!set.matches("https://example.com/public"));
    /// ```
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("^(?:{})$", p)).map_err(|e| {
                    ConfigError::InvalidPattern(format!("'{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Returns an empty set that matches nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the candidate fully matches any pattern
    pub fn matches(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(candidate))
    }

    /// Number of patterns in the set
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns whether the set has no patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
