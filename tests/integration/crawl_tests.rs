//! Integration tests for the crawler
//!
//! Most tests drive the coordinator through an in-memory page graph so the
//! expected visited set and word counts are exact. The last tests use
//! wiremock to run the real HTML parser end-to-end.

use ripple_tally::crawler::{
    CrawlCoordinator, CrawlSettings, HtmlPageParser, PageParser, ParsedPage, WebCrawler,
};
use ripple_tally::output::write_result;
use ripple_tally::profiler::Profiler;
use ripple_tally::url::ExclusionSet;
use ripple_tally::{CrawlError, ParseError, ParseResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A fixed web graph with per-URL parse call counting
#[derive(Default)]
struct GraphParser {
    pages: HashMap<String, ParsedPage>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
    panic_on: Option<String>,
}

impl GraphParser {
    fn page(mut self, url: &str, links: &[&str], words: &[(&str, u64)]) -> Self {
        self.pages.insert(
            url.to_string(),
            ParsedPage {
                links: links.iter().map(|l| l.to_string()).collect(),
                word_counts: words.iter().map(|(w, c)| (w.to_string(), *c)).collect(),
            },
        );
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn panicking_on(mut self, url: &str) -> Self {
        self.panic_on = Some(url.to_string());
        self
    }

    fn calls_for(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn max_calls(&self) -> usize {
        self.calls.lock().unwrap().values().copied().max().unwrap_or(0)
    }
}

impl PageParser for GraphParser {
    async fn parse(&self, url: &str) -> ParseResult<ParsedPage> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic_on.as_deref() == Some(url) {
            panic!("parser exploded on {}", url);
        }

        self.pages.get(url).cloned().ok_or_else(|| ParseError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

/// Lets a test keep a handle on the parser after handing it to a coordinator
struct Shared(Arc<GraphParser>);

impl PageParser for Shared {
    async fn parse(&self, url: &str) -> ParseResult<ParsedPage> {
        self.0.parse(url).await
    }
}

fn settings(max_depth: u32, parallelism: usize) -> CrawlSettings {
    CrawlSettings {
        max_depth,
        timeout: Duration::from_secs(3600),
        parallelism,
        popular_word_count: 100,
        parse_timeout: None,
        exclusions: ExclusionSet::empty(),
    }
}

fn seeds(urls: &[&str]) -> Vec<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

fn visited(urls: &[&str]) -> BTreeSet<String> {
    urls.iter().map(|u| u.to_string()).collect()
}

fn counts(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
    pairs.iter().map(|(w, c)| (w.to_string(), *c)).collect()
}

fn scenario_graph() -> GraphParser {
    GraphParser::default()
        .page("a", &["b", "c"], &[("x", 1)])
        .page("b", &["a"], &[("x", 2)])
        .page("c", &[], &[("y", 3)])
}

/// a -> b, c; b -> d; c -> d; d -> e. Every page has the word "w" once.
fn diamond_graph() -> GraphParser {
    GraphParser::default()
        .page("a", &["b", "c"], &[("w", 1), ("a", 1)])
        .page("b", &["d"], &[("w", 1)])
        .page("c", &["d"], &[("w", 1)])
        .page("d", &["e"], &[("w", 1), ("d", 4)])
        .page("e", &[], &[("w", 1), ("e", 1)])
}

/// 60 pages where page i links to 2i+1, 2i+2, i/2 and (7i mod 60)
fn dense_graph() -> GraphParser {
    let mut graph = GraphParser::default();
    for i in 0..60usize {
        let links: Vec<String> = [2 * i + 1, 2 * i + 2, i / 2, (7 * i) % 60]
            .iter()
            .filter(|&&j| j < 60)
            .map(|j| format!("p{}", j))
            .collect();
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
        let word = format!("w{}", i % 7);
        graph = graph.page(
            &format!("p{}", i),
            &link_refs,
            &[(word.as_str(), (i % 5) as u64 + 1), ("common", 1)],
        );
    }
    graph
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scenario_link_back_is_not_revisited() {
    for parallelism in [1, 4] {
        let coordinator =
            CrawlCoordinator::new(scenario_graph(), settings(2, parallelism)).unwrap();

        let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

        assert_eq!(result.visited, visited(&["a", "b", "c"]));
        assert_eq!(result.word_counts, counts(&[("x", 3), ("y", 3)]));
        assert_eq!(result.urls_visited, 3);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_double_counting_across_paths() {
    let parser = Arc::new(diamond_graph());
    let coordinator =
        CrawlCoordinator::new(Shared(Arc::clone(&parser)), settings(10, 8)).unwrap();

    let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

    assert_eq!(result.visited, visited(&["a", "b", "c", "d", "e"]));
    assert_eq!(result.word_counts["w"], 5);
    assert_eq!(result.word_counts["d"], 4);
    assert_eq!(parser.calls_for("d"), 1);
    assert_eq!(parser.max_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_depth_bound() {
    // a is at distance 0, b/c at 1, d at 2, e at 3
    let coordinator = CrawlCoordinator::new(diamond_graph(), settings(3, 4)).unwrap();
    let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

    assert_eq!(result.visited, visited(&["a", "b", "c", "d"]));
    assert!(!result.word_counts.contains_key("e"));
    assert_eq!(result.word_counts["w"], 4);

    let coordinator = CrawlCoordinator::new(diamond_graph(), settings(1, 4)).unwrap();
    let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();
    assert_eq!(result.visited, visited(&["a"]));
}

/// a -> b, c; b -> c; c -> d. d is two hops from a through c, three through b.
fn shortcut_graph() -> GraphParser {
    GraphParser::default()
        .page("a", &["b", "c"], &[("w", 1)])
        .page("b", &["c"], &[("w", 1)])
        .page("c", &["d"], &[("w", 1)])
        .page("d", &[], &[("w", 1), ("deep", 1)])
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_longer_path_does_not_hide_shorter_one() {
    // Sequential order reaches c through b first, with one hop left
    for parallelism in [1, 4] {
        for _ in 0..50 {
            let parser = Arc::new(shortcut_graph());
            let coordinator =
                CrawlCoordinator::new(Shared(Arc::clone(&parser)), settings(3, parallelism))
                    .unwrap();

            let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

            assert_eq!(
                result.visited,
                visited(&["a", "b", "c", "d"]),
                "parallelism {}",
                parallelism
            );
            assert_eq!(result.word_counts, counts(&[("w", 4), ("deep", 1)]));
            assert_eq!(parser.max_calls(), 1);
        }
    }
}

#[tokio::test]
async fn test_depth_zero_visits_nothing() {
    let parser = Arc::new(diamond_graph());
    let coordinator =
        CrawlCoordinator::new(Shared(Arc::clone(&parser)), settings(0, 2)).unwrap();

    let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

    assert_eq!(result.urls_visited, 0);
    assert!(result.word_counts.is_empty());
    assert_eq!(parser.max_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exclusion_is_absolute() {
    let mut settings = settings(10, 4);
    settings.exclusions = ExclusionSet::new(&["[cd]"]).unwrap();

    let parser = Arc::new(diamond_graph());
    let coordinator = CrawlCoordinator::new(Shared(Arc::clone(&parser)), settings).unwrap();

    // "c" is excluded even though it is also a seed
    let result = coordinator.crawl(&seeds(&["a", "c"])).await.unwrap();

    assert_eq!(result.visited, visited(&["a", "b"]));
    assert_eq!(result.word_counts["w"], 2);
    assert_eq!(parser.calls_for("c"), 0);
    assert_eq!(parser.calls_for("d"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parse_failure_is_contained() {
    // "missing" is not in the graph, so parsing it fails
    let graph = GraphParser::default()
        .page("a", &["missing", "b"], &[("x", 1)])
        .page("b", &["missing"], &[("x", 1)]);
    let parser = Arc::new(graph);
    let coordinator =
        CrawlCoordinator::new(Shared(Arc::clone(&parser)), settings(5, 4)).unwrap();

    let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

    // The failed URL stays visited and is never retried
    assert_eq!(result.visited, visited(&["a", "b", "missing"]));
    assert_eq!(result.word_counts, counts(&[("x", 2)]));
    assert_eq!(parser.calls_for("missing"), 1);
}

#[tokio::test]
async fn test_past_deadline_visits_nothing() {
    let mut settings = settings(5, 2);
    settings.timeout = Duration::ZERO;

    let coordinator = CrawlCoordinator::new(scenario_graph(), settings).unwrap();
    let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

    assert_eq!(result.urls_visited, 0);
    assert!(result.word_counts.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_far_deadline_matches_unbounded_crawl() {
    let mut far = settings(6, 4);
    far.timeout = Duration::MAX;

    let bounded = CrawlCoordinator::new(dense_graph(), settings(6, 4))
        .unwrap()
        .crawl(&seeds(&["p0"]))
        .await
        .unwrap();
    let unbounded = CrawlCoordinator::new(dense_graph(), far)
        .unwrap()
        .crawl(&seeds(&["p0"]))
        .await
        .unwrap();

    assert_eq!(bounded.visited, unbounded.visited);
    assert_eq!(bounded.word_counts, unbounded.word_counts);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_sequential_and_parallel_agree() {
    for depth in [1, 2, 3, 5, 8] {
        let sequential = CrawlCoordinator::new(dense_graph(), settings(depth, 1))
            .unwrap()
            .crawl(&seeds(&["p0", "p31"]))
            .await
            .unwrap();

        for parallelism in [2, 8, 32] {
            let parallel = CrawlCoordinator::new(dense_graph(), settings(depth, parallelism))
                .unwrap()
                .crawl(&seeds(&["p0", "p31"]))
                .await
                .unwrap();

            assert_eq!(sequential.visited, parallel.visited, "depth {}", depth);
            assert_eq!(sequential.word_counts, parallel.word_counts, "depth {}", depth);
            assert_eq!(sequential.urls_visited, parallel.urls_visited);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_deadline_mid_crawl_yields_partial_result() {
    // A chain p0 -> p1 -> ... -> p9 where every parse takes one second
    let mut graph = GraphParser::default().with_delay(Duration::from_secs(1));
    for i in 0..10 {
        let next = format!("p{}", i + 1);
        graph = graph.page(&format!("p{}", i), &[next.as_str()], &[("tick", 1)]);
    }

    let mut settings = settings(20, 2);
    settings.timeout = Duration::from_millis(3500);

    let coordinator = CrawlCoordinator::new(graph, settings).unwrap();
    let result = coordinator.crawl(&seeds(&["p0"])).await.unwrap();

    // p3 starts at t=3s and is allowed to finish; p4 would start at t=4s
    assert_eq!(result.visited, visited(&["p0", "p1", "p2", "p3"]));
    assert_eq!(result.word_counts["tick"], 4);
}

#[tokio::test(start_paused = true)]
async fn test_parse_timeout_counts_as_failure() {
    let graph = GraphParser::default()
        .with_delay(Duration::from_secs(10))
        .page("a", &["b"], &[("x", 1)]);

    let mut settings = settings(5, 2);
    settings.parse_timeout = Some(Duration::from_secs(1));

    let coordinator = CrawlCoordinator::new(graph, settings).unwrap();
    let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

    assert_eq!(result.visited, visited(&["a"]));
    assert!(result.word_counts.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_task_panic_is_surfaced() {
    for parallelism in [1, 4] {
        let graph = scenario_graph().panicking_on("c");
        let coordinator = CrawlCoordinator::new(graph, settings(3, parallelism)).unwrap();

        let result = coordinator.crawl(&seeds(&["a"])).await;

        match result {
            Err(CrawlError::TaskFailed { url, message }) => {
                assert_eq!(url, "c");
                assert!(message.contains("parser exploded"));
            }
            other => panic!("expected TaskFailed, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_independent_crawls_do_not_share_state() {
    let coordinator = CrawlCoordinator::new(scenario_graph(), settings(2, 2)).unwrap();

    let first = coordinator.crawl(&seeds(&["a"])).await.unwrap();
    let second = coordinator.crawl(&seeds(&["a"])).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.word_counts, counts(&[("x", 3), ("y", 3)]));
}

#[tokio::test]
async fn test_popular_words_ranked() {
    let mut settings = settings(5, 2);
    settings.popular_word_count = 2;

    let coordinator = CrawlCoordinator::new(diamond_graph(), settings).unwrap();
    let result = coordinator.crawl(&seeds(&["a"])).await.unwrap();

    assert_eq!(
        result.popular_words,
        vec![("w".to_string(), 5), ("d".to_string(), 4)]
    );
    // The full map is still available
    assert_eq!(result.word_counts.len(), 4);
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_crawl_over_http() {
    // Start a mock server
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(&format!(
            r#"<p>rust crawler</p>
            <a href="{base}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="/private">Private</a>"#,
            base = base_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_page(r#"<p>rust rust</p><a href="/">Home</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html_page("<p>secret</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client =
        ripple_tally::crawler::build_http_client(Duration::from_secs(5)).unwrap();
    let parser = HtmlPageParser::new(client, ExclusionSet::empty());

    let mut settings = settings(3, 4);
    settings.exclusions =
        ExclusionSet::new(&[format!("{}/private", regex::escape(&base_url))]).unwrap();

    let profiler = Profiler::new();
    let crawler = profiler.wrap(CrawlCoordinator::new(parser, settings).unwrap());

    let result = crawler.crawl(&[format!("{}/", base_url)]).await.unwrap();

    assert_eq!(
        result.visited,
        [
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
        .into_iter()
        .collect::<BTreeSet<_>>()
    );
    assert_eq!(result.word_counts["rust"], 3);
    assert_eq!(result.word_counts["crawler"], 1);
    assert!(!result.word_counts.contains_key("secret"));
    assert!(profiler.state().total("CrawlCoordinator#crawl").is_some());

    // Result and profile reports land on disk
    let dir = tempfile::tempdir().unwrap();
    let result_path = dir.path().join("result.json");
    let profile_path = dir.path().join("profile.txt");
    write_result(&result, &result_path).unwrap();
    profiler.write_data(&profile_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(std::fs::read_to_string(&result_path).unwrap().trim()).unwrap();
    assert_eq!(json["urlsVisited"], 3);
    assert_eq!(json["wordCounts"]["rust"], 3);

    let profile = std::fs::read_to_string(&profile_path).unwrap();
    assert!(profile.contains("CrawlCoordinator#crawl took "));
}

#[tokio::test]
async fn test_crawl_local_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        r#"<html><body>alpha beta <a href="second.html">next</a></body></html>"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("second.html"),
        r#"<html><body>beta gamma <a href="index.html">back</a></body></html>"#,
    )
    .unwrap();

    let seed = url::Url::from_file_path(dir.path().join("index.html"))
        .unwrap()
        .to_string();
    let ignored = ExclusionSet::new(&["next", "back"]).unwrap();
    let client =
        ripple_tally::crawler::build_http_client(Duration::from_secs(5)).unwrap();
    let coordinator =
        CrawlCoordinator::new(HtmlPageParser::new(client, ignored), settings(4, 1)).unwrap();

    let result = coordinator.crawl(&[seed]).await.unwrap();

    assert_eq!(result.urls_visited, 2);
    assert_eq!(result.word_counts, counts(&[("alpha", 1), ("beta", 2), ("gamma", 1)]));
}
