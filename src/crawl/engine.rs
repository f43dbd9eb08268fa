// src/crawl/engine.rs
// =============================================================================
// The crawl loop.
//
// How it works:
// 1. Start with the start URL in the frontier
// 2. Take the oldest URL, mark it visited
// 3. Skip it if robots.txt says no
// 4. Fetch it (with retries); failures and non-HTML pages are dead ends
// 5. Look for the keyword, record a Match on a hit
// 6. Queue every same-domain, allowed, never-seen link on the page. A
//    redirect is treated as a page with a single link: its Location header
// 7. Wait the politeness delay, repeat until the frontier is empty or the
//    page ceiling is reached
//
// Redirect targets go through the same filters as links, so a redirect can
// never lead us into a robots.txt-disallowed path or to a page we already
// fetched.
//
// One URL is completely handled before the next one starts, so there is
// never more than one request in flight against the site.
// =============================================================================

use super::fetch::{is_html, FetchResult, Fetcher};
use super::frontier::{CrawlTarget, Frontier};
use super::normalize::{normalize, parse_start_url, same_domain};
use super::policy::PolitenessPolicy;
use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::matcher::{extract_links, KeywordMatcher, Match, ScraperPage};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

/// Terminal state of a dequeued URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlOutcome {
    /// Fetched and parsed
    Visited,
    /// Answered with a redirect; the target was offered to the frontier
    Redirected,
    /// Every attempt failed
    Failed,
    SkippedRobots,
    SkippedOutOfDomain,
    SkippedNonHtml,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub url: String,
    pub outcome: UrlOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub robots_skipped: usize,
    pub out_of_domain: usize,
    pub non_html: usize,
    pub redirects: usize,
    pub links_enqueued: usize,
    pub stopped_by_ceiling: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub start_url: String,
    pub keyword: String,
    pub matches: Vec<Match>,
    pub stats: CrawlStats,
    /// Every dequeued URL with its outcome, in processing order
    pub visits: Vec<Visit>,
}

// Everything that changes during one run
#[derive(Default)]
struct CrawlState {
    frontier: Frontier,
    visited: HashSet<String>,
    matches: Vec<Match>,
    stats: CrawlStats,
    visits: Vec<Visit>,
}

impl CrawlState {
    fn record(&mut self, target: &CrawlTarget, outcome: UrlOutcome) {
        match outcome {
            UrlOutcome::Visited => {}
            UrlOutcome::Redirected => self.stats.redirects += 1,
            UrlOutcome::Failed => self.stats.fetch_failures += 1,
            UrlOutcome::SkippedRobots => self.stats.robots_skipped += 1,
            UrlOutcome::SkippedOutOfDomain => self.stats.out_of_domain += 1,
            UrlOutcome::SkippedNonHtml => self.stats.non_html += 1,
        }
        self.visits.push(Visit {
            url: target.as_str().to_string(),
            outcome,
        });
    }

    fn ceiling_reached(&self, max_pages: Option<usize>) -> bool {
        max_pages.is_some_and(|max| self.stats.pages_fetched >= max)
    }
}

pub struct Crawler {
    config: CrawlConfig,
    fetcher: Fetcher,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self { config, fetcher })
    }

    /// Crawls the site of `start_url` looking for `keyword`.
    ///
    /// Only bad input fails the run; unreachable pages, a missing robots.txt
    /// and broken HTML are all handled inside the loop.
    pub async fn run(&self, start_url: &str, keyword: &str) -> Result<CrawlReport, CrawlError> {
        if keyword.trim().is_empty() {
            return Err(CrawlError::EmptyKeyword);
        }
        let start = parse_start_url(start_url)?;
        let matcher = KeywordMatcher::new(keyword)?;

        info!("Crawling {} for '{}'", start, keyword);

        let policy = PolitenessPolicy::load(
            self.fetcher.client(),
            &start,
            self.config.robots_agent(),
            self.config.default_delay,
        )
        .await;
        debug!("Using {:?}", policy);

        let mut state = CrawlState::default();
        state.frontier.push(CrawlTarget::new(start.clone()));

        loop {
            // Checked before popping, so a ceiling of N means exactly N fetches
            if state.ceiling_reached(self.config.max_pages) {
                // Only report the ceiling if it actually left work undone
                if !state.frontier.is_empty() {
                    info!("Page ceiling of {:?} reached", self.config.max_pages);
                    state.stats.stopped_by_ceiling = true;
                }
                break;
            }

            let Some(target) = state.frontier.pop() else {
                break;
            };

            // insert() returns false if the URL was already there
            if !state.visited.insert(target.as_str().to_string()) {
                continue;
            }

            // Skips cost no request, so they don't wait out the delay either
            if !same_domain(&start, target.url()) {
                debug!("Out of domain: {}", target.as_str());
                state.record(&target, UrlOutcome::SkippedOutOfDomain);
                continue;
            }

            if !policy.can_fetch(target.as_str()) {
                debug!("Blocked by robots.txt: {}", target.as_str());
                state.record(&target, UrlOutcome::SkippedRobots);
                continue;
            }

            debug!(
                "Fetching [{}] ({} queued): {}",
                state.stats.pages_fetched + 1,
                state.frontier.len(),
                target.as_str()
            );
            let result = self.fetcher.fetch(target.as_str()).await;
            // Counted whether it worked or not: the site saw the request
            state.stats.pages_fetched += 1;

            match result {
                FetchResult::Failed { reason, attempts } => {
                    warn!(
                        "Failed to fetch {} after {} attempt(s): {}",
                        target.as_str(),
                        attempts,
                        reason
                    );
                    state.record(&target, UrlOutcome::Failed);
                }
                FetchResult::Redirect { status, location } => {
                    debug!("{} redirects ({}) to {}", target.as_str(), status, location);
                    // Resolved against the URL that answered, like any relative link
                    if !self.enqueue_link(&mut state, &policy, &start, target.url(), &location) {
                        debug!("Redirect target not queued: {}", location);
                    }
                    state.record(&target, UrlOutcome::Redirected);
                }
                FetchResult::Ok { content_type, .. } if !is_html(&content_type) => {
                    debug!("Not HTML ({}): {}", content_type, target.as_str());
                    state.record(&target, UrlOutcome::SkippedNonHtml);
                }
                FetchResult::Ok { body, .. } => {
                    self.scan_page(&mut state, &matcher, &policy, &start, &target, &body);
                    state.record(&target, UrlOutcome::Visited);
                }
            }

            // Politeness delay after every request, successful or not
            tokio::time::sleep(policy.delay()).await;
        }

        info!(
            "Crawl finished: {} page(s) fetched, {} match(es), {} failure(s)",
            state.stats.pages_fetched,
            state.matches.len(),
            state.stats.fetch_failures
        );

        Ok(CrawlReport {
            start_url: start.to_string(),
            keyword: keyword.to_string(),
            matches: state.matches,
            stats: state.stats,
            visits: state.visits,
        })
    }

    // Keyword test plus link discovery for one HTML page.
    // Kept synchronous so the parsed document never lives across an await.
    fn scan_page(
        &self,
        state: &mut CrawlState,
        matcher: &KeywordMatcher,
        policy: &PolitenessPolicy,
        start: &Url,
        target: &CrawlTarget,
        body: &str,
    ) {
        if let Some(found) = matcher.find_match(body, target.as_str()) {
            info!("Match on {}", found.url);
            state.matches.push(found);
        }

        let page = ScraperPage::parse(body);
        for href in extract_links(&page) {
            self.enqueue_link(state, policy, start, target.url(), &href);
        }
    }

    // Resolves `href` against `base` and queues it if we may crawl it.
    // Returns true if it was queued.
    fn enqueue_link(
        &self,
        state: &mut CrawlState,
        policy: &PolitenessPolicy,
        start: &Url,
        base: &Url,
        href: &str,
    ) -> bool {
        // mailto:, javascript:, #top and friends come back as None
        let Some(link) = normalize(base, href) else {
            return false;
        };
        if !same_domain(start, &link) {
            return false;
        }
        // Already fetched or already waiting
        if state.visited.contains(link.as_str()) || state.frontier.contains(link.as_str()) {
            return false;
        }
        // Disallowed URLs never even enter the queue
        if !policy.can_fetch(link.as_str()) {
            return false;
        }
        let queued = state.frontier.push(CrawlTarget::new(link));
        if queued {
            state.stats.links_enqueued += 1;
        }
        queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config() -> CrawlConfig {
        CrawlConfig {
            retry_backoff: Duration::ZERO,
            default_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(5),
            ..CrawlConfig::default()
        }
    }

    async fn mount_html(server: &MockServer, route: &str, html: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(html, "text/html; charset=utf-8"),
            )
            .expect(times)
            .mount(server)
            .await;
    }

    async fn no_robots(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(server)
            .await;
    }

    fn visited_paths(report: &CrawlReport, server: &MockServer) -> Vec<String> {
        report
            .visits
            .iter()
            .map(|visit| visit.url.trim_start_matches(&server.uri()).to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_fragment_links_are_fetched_once() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        mount_html(
            &server,
            "/a",
            r#"<a href="/b">b</a> <a href="/b#frag">b again</a> <a href="b">b relative</a>"#,
            1,
        )
        .await;
        mount_html(&server, "/b", r#"<a href="/a#top">back</a>"#, 1).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler
            .run(&format!("{}/a", server.uri()), "nothing")
            .await
            .unwrap();

        assert_eq!(visited_paths(&report, &server), vec!["/a", "/b"]);
        assert_eq!(report.stats.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_breadth_first_order() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        mount_html(&server, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#, 1).await;
        mount_html(&server, "/a", r#"<a href="/a1">a1</a><a href="/b">b</a>"#, 1).await;
        mount_html(&server, "/b", r#"<a href="/b1">b1</a>"#, 1).await;
        mount_html(&server, "/a1", "leaf", 1).await;
        mount_html(&server, "/b1", "leaf", 1).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "leaf").await.unwrap();

        assert_eq!(
            visited_paths(&report, &server),
            vec!["/", "/a", "/b", "/a1", "/b1"]
        );
        assert_eq!(report.matches.len(), 2);
        assert!(report.visits.iter().all(|v| v.outcome == UrlOutcome::Visited));
    }

    #[tokio::test]
    async fn test_stays_on_start_host() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        let offsite = format!("http://localhost:{}/offsite", server.address().port());
        mount_html(
            &server,
            "/",
            &format!(r#"<a href="https://other.example/x">x</a><a href="{}">o</a>"#, offsite),
            1,
        )
        .await;
        mount_html(&server, "/offsite", "never", 0).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "never").await.unwrap();

        assert_eq!(report.stats.pages_fetched, 1);
        assert_eq!(report.stats.links_enqueued, 0);
    }

    #[tokio::test]
    async fn test_robots_disallowed_urls_are_never_requested() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
            )
            .mount(&server)
            .await;
        mount_html(
            &server,
            "/",
            r#"<a href="/private/x">p</a><a href="/public">ok</a>"#,
            1,
        )
        .await;
        mount_html(&server, "/private/x", "secret", 0).await;
        mount_html(&server, "/public", "open", 1).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "secret").await.unwrap();

        assert!(report.matches.is_empty());
        assert_eq!(visited_paths(&report, &server), vec!["/", "/public"]);
    }

    #[tokio::test]
    async fn test_disallowed_start_url_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
            .mount(&server)
            .await;
        mount_html(&server, "/", "hello", 0).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "hello").await.unwrap();

        assert_eq!(report.stats.pages_fetched, 0);
        assert_eq!(report.stats.robots_skipped, 1);
        assert_eq!(report.visits[0].outcome, UrlOutcome::SkippedRobots);
    }

    #[tokio::test]
    async fn test_page_ceiling_of_one_fetches_exactly_once() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        let links: String = (1..=5)
            .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
            .collect();
        mount_html(&server, "/", &format!("hello {}", links), 1).await;
        for i in 1..=5 {
            mount_html(&server, &format!("/p{}", i), "hello", 0).await;
        }

        let config = CrawlConfig {
            max_pages: Some(1),
            ..fast_config()
        };
        let crawler = Crawler::new(config).unwrap();
        let report = crawler.run(&server.uri(), "hello").await.unwrap();

        assert_eq!(report.stats.pages_fetched, 1);
        assert!(report.stats.stopped_by_ceiling);
        assert_eq!(report.matches.len(), 1);
    }

    #[tokio::test]
    async fn test_ceiling_not_reported_when_site_runs_out_first() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        mount_html(&server, "/", "hello, no links here", 1).await;

        let config = CrawlConfig {
            max_pages: Some(1),
            ..fast_config()
        };
        let crawler = Crawler::new(config).unwrap();
        let report = crawler.run(&server.uri(), "hello").await.unwrap();

        assert_eq!(report.stats.pages_fetched, 1);
        assert!(!report.stats.stopped_by_ceiling);
    }

    #[tokio::test]
    async fn test_redirect_into_disallowed_path_is_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
            )
            .mount(&server)
            .await;
        mount_html(&server, "/", r#"<a href="/go">go</a>"#, 1).await;
        Mock::given(method("GET"))
            .and(path("/go"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/private/secret"))
            .expect(1)
            .mount(&server)
            .await;
        mount_html(&server, "/private/secret", "secret", 0).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "secret").await.unwrap();

        assert!(report.matches.is_empty());
        assert_eq!(visited_paths(&report, &server), vec!["/", "/go"]);
        assert_eq!(report.visits[1].outcome, UrlOutcome::Redirected);
        assert_eq!(report.stats.redirects, 1);
    }

    #[tokio::test]
    async fn test_redirect_onto_visited_page_does_not_refetch_it() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        mount_html(&server, "/", r#"<a href="/b">b</a><a href="/old">old</a>"#, 1).await;
        mount_html(&server, "/b", "page b", 1).await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/b"))
            .expect(1)
            .mount(&server)
            .await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "nothing").await.unwrap();

        assert_eq!(visited_paths(&report, &server), vec!["/", "/b", "/old"]);
        assert_eq!(report.stats.pages_fetched, 3);
    }

    #[tokio::test]
    async fn test_redirect_target_is_crawled_as_a_new_page() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        mount_html(&server, "/", r#"<a href="/old">old</a><a href="/c">c</a>"#, 1).await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .expect(1)
            .mount(&server)
            .await;
        mount_html(&server, "/c", "page c", 1).await;
        mount_html(&server, "/new", "<title>New</title>hello", 1).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "hello").await.unwrap();

        // The target joins the back of the queue, behind /c
        assert_eq!(visited_paths(&report, &server), vec!["/", "/old", "/c", "/new"]);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].url, format!("{}/new", server.uri()));
    }

    #[tokio::test]
    async fn test_crawl_delay_follows_every_fetch_including_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 1\n"))
            .mount(&server)
            .await;
        mount_html(&server, "/", r#"<a href="/down">d</a>"#, 1).await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        // No default delay, so any waiting comes from Crawl-delay
        let config = CrawlConfig {
            max_retries: 0,
            ..fast_config()
        };
        let crawler = Crawler::new(config).unwrap();

        let started = Instant::now();
        let report = crawler.run(&server.uri(), "nothing").await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.stats.pages_fetched, 2);
        assert_eq!(report.stats.fetch_failures, 1);
        assert!(
            elapsed >= Duration::from_secs(2),
            "two fetches should wait 2s in total, waited {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_robots_skips_do_not_wait() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
            .mount(&server)
            .await;

        let config = CrawlConfig {
            default_delay: Duration::from_secs(3),
            ..fast_config()
        };
        let crawler = Crawler::new(config).unwrap();

        let started = Instant::now();
        let report = crawler.run(&server.uri(), "hello").await.unwrap();

        assert_eq!(report.stats.robots_skipped, 1);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_failed_pages_do_not_stop_the_crawl() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        mount_html(&server, "/", r#"<a href="/down">d</a><a href="/up">u</a>"#, 1).await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;
        mount_html(&server, "/up", "<title>Up</title>found it", 1).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "found").await.unwrap();

        assert_eq!(report.stats.fetch_failures, 1);
        assert_eq!(report.stats.pages_fetched, 3);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].title, "Up");
        assert_eq!(report.visits[1].outcome, UrlOutcome::Failed);
    }

    #[tokio::test]
    async fn test_non_html_is_a_dead_end() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        mount_html(&server, "/", r#"<a href="/file.pdf">pdf</a>"#, 1).await;
        Mock::given(method("GET"))
            .and(path("/file.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("hello <a href=\"/hidden\">x</a>", "application/pdf"),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_html(&server, "/hidden", "hello", 0).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "hello").await.unwrap();

        assert!(report.matches.is_empty());
        assert_eq!(report.stats.non_html, 1);
    }

    #[tokio::test]
    async fn test_match_snippet_scenario() {
        let server = MockServer::start().await;
        no_robots(&server).await;
        mount_html(&server, "/", "...xxxx hello world yyyy...", 1).await;

        let crawler = Crawler::new(fast_config()).unwrap();
        let report = crawler.run(&server.uri(), "hello").await.unwrap();

        assert_eq!(report.matches.len(), 1);
        let found = &report.matches[0];
        assert!(found.snippet.contains("hello"));
        assert_eq!(found.title, "");
        assert_eq!(found.url, format!("{}/", server.uri()));
    }

    #[tokio::test]
    async fn test_rejects_bad_start_parameters() {
        let crawler = Crawler::new(fast_config()).unwrap();

        assert!(matches!(
            crawler.run("https://example.com/", "  ").await,
            Err(CrawlError::EmptyKeyword)
        ));
        assert!(matches!(
            crawler.run("mailto:someone@example.com", "hello").await,
            Err(CrawlError::InvalidStartUrl { .. })
        ));
    }
}
