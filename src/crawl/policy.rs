// src/crawl/policy.rs
// =============================================================================
// Politeness: robots.txt rules plus the delay between requests.
//
// The policy is loaded once per crawl from {scheme}://{host}/robots.txt.
// If that file is missing or broken we don't give up on the crawl: we fall
// back to "everything allowed" and the default delay.
//
// Parsing the robots exclusion syntax is done by the `texting_robots` crate.
// =============================================================================

use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use texting_robots::Robot;
use tracing::{debug, info, warn};
use url::Url;

pub struct PolitenessPolicy {
    // None = allow everything
    rules: Option<Robot>,
    crawl_delay: Duration,
}

impl PolitenessPolicy {
    /// Policy used when robots.txt can't be fetched or parsed.
    pub fn allow_all(default_delay: Duration) -> Self {
        Self {
            rules: None,
            crawl_delay: default_delay,
        }
    }

    /// Builds a policy from the body of a robots.txt file.
    ///
    /// `agent` is the product token of our user agent. A declared
    /// Crawl-delay wins over `default_delay` when it is a positive number.
    pub fn from_robots_txt(agent: &str, body: &str, default_delay: Duration) -> Self {
        let robot = match Robot::new(agent, body.as_bytes()) {
            Ok(robot) => robot,
            Err(e) => {
                warn!("Unparseable robots.txt, allowing all: {}", e);
                return Self::allow_all(default_delay);
            }
        };

        let crawl_delay = robot
            .delay
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f32(secs).ok())
            .unwrap_or(default_delay);

        Self {
            rules: Some(robot),
            crawl_delay,
        }
    }

    /// Fetches and parses robots.txt for the site that `site_url` belongs to.
    ///
    /// Never fails: network errors, non-200 answers and unreadable bodies all
    /// produce the permissive fallback.
    pub async fn load(
        client: &Client,
        site_url: &Url,
        agent: &str,
        default_delay: Duration,
    ) -> Self {
        let robots_url = match site_url.join("/robots.txt") {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot build robots.txt URL for {}: {}", site_url, e);
                return Self::allow_all(default_delay);
            }
        };

        debug!("Fetching {}", robots_url);

        let response = match client.get(robots_url.as_str()).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("robots.txt unreachable ({}), allowing all", e);
                return Self::allow_all(default_delay);
            }
        };

        if response.status() != StatusCode::OK {
            info!(
                "robots.txt returned HTTP {}, allowing all",
                response.status().as_u16()
            );
            return Self::allow_all(default_delay);
        }

        match response.text().await {
            Ok(body) => {
                let policy = Self::from_robots_txt(agent, &body, default_delay);
                info!("Loaded robots.txt, crawl delay {:?}", policy.delay());
                policy
            }
            Err(e) => {
                warn!("Could not read robots.txt body ({}), allowing all", e);
                Self::allow_all(default_delay)
            }
        }
    }

    /// Whether robots.txt lets us request `url`.
    ///
    /// Used both before enqueueing a link and after dequeuing it.
    pub fn can_fetch(&self, url: &str) -> bool {
        match &self.rules {
            Some(robot) => robot.allowed(url),
            None => true,
        }
    }

    /// How long to wait after each request.
    pub fn delay(&self) -> Duration {
        self.crawl_delay
    }

    pub fn is_permissive(&self) -> bool {
        self.rules.is_none()
    }
}

impl fmt::Debug for PolitenessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolitenessPolicy")
            .field("allow_all", &self.is_permissive())
            .field("crawl_delay", &self.crawl_delay)
            .finish()
    }
}
