use url::Url;

/// Returns true for schemes the page parser knows how to load
pub fn is_crawlable_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https" | "file")
}

/// Resolves a link href to an absolute URL and validates it
///
/// The fragment is dropped so `page#a` and `page#b` are the same page for
/// the visited set. Query strings are kept untouched.
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links (same page anchors)
/// - Invalid URLs
/// - Schemes other than http, https and file after resolution
///
/// # Examples
///
/// ```
/// use ripple_tally::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// assert_eq!(
///     resolve_link("intro.html#top", &base).as_deref(),
///     Some("https://example.com/docs/intro.html")
/// );
/// assert_eq!(resolve_link("mailto:me@example.com", &base), None);
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if !is_crawlable_scheme(&absolute) {
        return None;
    }
    absolute.set_fragment(None);

    Some(absolute.to_string())
}
