// src/matcher/keyword.rs
// =============================================================================
// Keyword matching and snippet extraction.
//
// The keyword is searched case-insensitively in the raw page text, markup
// included. When it is found we build a Match with:
// - the page title (or "" if there is none)
// - a snippet: up to 60 characters on each side of the first occurrence,
//   on the same line
//
// If for some reason no window can be cut around the keyword, the snippet is
// the first 120 characters of the page instead.
// =============================================================================

use super::html::{page_title, ScraperPage};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Characters of context kept on each side of the keyword.
pub const SNIPPET_CONTEXT: usize = 60;

/// Length of the fallback snippet.
pub const FALLBACK_SNIPPET_LEN: usize = 2 * SNIPPET_CONTEXT;

/// A page that contains the keyword.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    presence: Regex,
    // .{0,60}KEYWORD.{0,60}, where '.' never crosses a newline
    window: Regex,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Result<Self, regex::Error> {
        let escaped = regex::escape(keyword);

        let presence = RegexBuilder::new(&escaped).case_insensitive(true).build()?;
        let window = RegexBuilder::new(&format!(
            ".{{0,{n}}}{kw}.{{0,{n}}}",
            n = SNIPPET_CONTEXT,
            kw = escaped
        ))
        .case_insensitive(true)
        .build()?;

        Ok(Self {
            presence,
            window,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.presence.is_match(text)
    }

    /// Tests `body` for the keyword and builds a Match for `url` on a hit.
    pub fn find_match(&self, body: &str, url: &str) -> Option<Match> {
        if !self.is_match(body) {
            return None;
        }

        let title = page_title(&ScraperPage::parse(body));

        Some(Match {
            url: url.to_string(),
            title,
            snippet: self.snippet(body),
        })
    }

    /// The context window around the first occurrence of the keyword.
    pub fn snippet(&self, text: &str) -> String {
        match self.window.find(text) {
            Some(m) => collapse_newlines(m.as_str()),
            None => fallback_snippet(text),
        }
    }
}

fn fallback_snippet(text: &str) -> String {
    let head: String = text.chars().take(FALLBACK_SNIPPET_LEN).collect();
    collapse_newlines(&head)
}

// Snippets end up in one CSV cell, so no line breaks
fn collapse_newlines(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(keyword: &str) -> KeywordMatcher {
        KeywordMatcher::new(keyword).unwrap()
    }

    #[test]
    fn test_no_match_returns_none() {
        let m = matcher("hello");
        assert_eq!(m.find_match("<p>goodbye</p>", "https://example.com/"), None);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let m = matcher("hello");
        let found = m.find_match("<p>Say HeLLo there</p>", "https://example.com/").unwrap();
        assert!(found.snippet.contains("HeLLo"));
    }

    #[test]
    fn test_keyword_with_regex_characters_is_literal() {
        let m = matcher("c++ (beta)");
        assert!(m.is_match("we love C++ (BETA) here"));
        assert!(!m.is_match("we love c (beta) here"));
    }

    #[test]
    fn test_snippet_has_at_most_sixty_chars_each_side() {
        let m = matcher("hello");
        let body = format!("{}xxxx hello world yyyy{}", "a".repeat(200), "b".repeat(200));
        let found = m.find_match(&body, "https://example.com/").unwrap();

        assert!(found.snippet.contains("hello"));
        let start = found.snippet.find("hello").unwrap();
        let before = &found.snippet[..start];
        let after = &found.snippet[start + "hello".len()..];
        assert!(before.chars().count() <= SNIPPET_CONTEXT);
        assert!(after.chars().count() <= SNIPPET_CONTEXT);
        assert_eq!(before.chars().count(), SNIPPET_CONTEXT);
    }

    #[test]
    fn test_snippet_uses_first_occurrence() {
        let m = matcher("cat");
        let body = format!("first cat here{}second cat there", " ".repeat(300));
        assert!(m.snippet(&body).starts_with("first cat here"));
    }

    #[test]
    fn test_snippet_stops_at_newlines() {
        let m = matcher("hello");
        let snippet = m.snippet("line one\nsay hello now\nline three");
        assert_eq!(snippet, "say hello now");
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        let m = matcher("키워드");
        let body = format!("{}키워드{}", "가".repeat(100), "나".repeat(100));
        let snippet = m.snippet(&body);

        assert_eq!(snippet.chars().count(), SNIPPET_CONTEXT * 2 + 3);
    }

    #[test]
    fn test_fallback_snippet_is_bounded_and_single_line() {
        let text = format!("line\r\nnext {}", "z".repeat(300));
        let snippet = fallback_snippet(&text);

        assert!(snippet.chars().count() <= FALLBACK_SNIPPET_LEN);
        assert!(!snippet.contains('\n'));
        assert!(!snippet.contains('\r'));
        assert!(snippet.starts_with("line  next"));
    }

    #[test]
    fn test_match_carries_title_and_url() {
        let m = matcher("rust");
        let body = "<html><head><title> Rust Forum </title></head><body>I like rust</body></html>";
        let found = m.find_match(body, "https://example.com/forum").unwrap();

        assert_eq!(found.url, "https://example.com/forum");
        assert_eq!(found.title, "Rust Forum");
    }

    #[test]
    fn test_keyword_inside_markup_counts() {
        let m = matcher("secret");
        let body = r#"<div class="secret">nothing visible</div>"#;
        assert!(m.find_match(body, "https://example.com/").is_some());
    }
}
