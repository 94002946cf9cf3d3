//! Duplicate ticket detection

use std::collections::HashSet;
use std::sync::OnceLock;

use qabridge_common::MatchStrategy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ReportResult;
use crate::ticket::ticket_title;
use crate::tracker::Tracker;

/// Titles known to exist in the tracker during one run. Grows only.
#[derive(Debug, Default)]
pub struct DedupCache {
    titles: HashSet<String>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    /// Returns true when the title was not cached before
    pub fn insert(&mut self, title: &str) -> bool {
        self.titles.insert(title.to_string())
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// Result of looking for an existing ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", content = "reason", rename_all = "snake_case")]
pub enum DuplicateCheck {
    /// Already seen this run, no query made
    Cached,
    /// Tracker search showed the title
    Found,
    NotFound,
    /// Query failed; treated as not found so the failure still gets filed
    QueryFailed(String),
}

impl DuplicateCheck {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DuplicateCheck::Cached | DuplicateCheck::Found)
    }
}

/// Look for an active ticket for `case_name`. Query errors fail open; only a
/// fatal session error is returned as `Err`.
pub async fn check_duplicate<T: Tracker + ?Sized>(
    tracker: &T,
    cache: &mut DedupCache,
    strategy: MatchStrategy,
    case_name: &str,
) -> ReportResult<DuplicateCheck> {
    let title = ticket_title(case_name);
    if cache.contains(&title) {
        debug!("Dedup cache hit: {}", title);
        return Ok(DuplicateCheck::Cached);
    }

    match tracker.search_active(&title).await {
        Ok(body) => {
            if page_lists_title(&body, &title, strategy) {
                cache.insert(&title);
                Ok(DuplicateCheck::Found)
            } else {
                Ok(DuplicateCheck::NotFound)
            }
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!("Duplicate check for {} failed, filing anyway: {}", title, e);
            Ok(DuplicateCheck::QueryFailed(e.to_string()))
        }
    }
}

/// Whether a search result page shows a ticket titled `title`
pub fn page_lists_title(body: &str, title: &str, strategy: MatchStrategy) -> bool {
    match strategy {
        MatchStrategy::Substring => body.contains(title),
        MatchStrategy::Exact => bug_link_texts(body).iter().any(|t| t == title),
    }
}

fn bug_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*["'][^"']*bug-view-\d+[^"']*["'][^>]*>(.*?)</a>"#)
            .expect("bug link pattern is valid")
    })
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Text of every link to a bug view page, tags stripped and entities decoded
fn bug_link_texts(body: &str) -> Vec<String> {
    bug_link_pattern()
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            let text = tag_pattern().replace_all(m.as_str(), "");
            decode_entities(text.trim())
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<table>
  <tr><td><a href='/zentao/bug-view-12.html' title='[UI自动化失败] login_test'>[UI自动化失败] login_test</a></td></tr>
  <tr><td><a href="/zentao/bug-view-13.html"><span class="pri">3</span> [UI自动化失败] login_test_v2 &amp; more</a></td></tr>
  <tr><td><a href="/zentao/product-view-4.html">[UI自动化失败] search</a></td></tr>
</table>"#;

    #[test]
    fn test_cache_is_monotonic() {
        let mut cache = DedupCache::new();
        assert!(cache.insert("a"));
        assert!(!cache.insert("a"));
        assert!(cache.insert("b"));
        assert!(cache.contains("a"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_substring_match() {
        assert!(page_lists_title(PAGE, "[UI自动化失败] login_test", MatchStrategy::Substring));
        // Substring matching also hits the longer title and non-bug links
        assert!(page_lists_title(PAGE, "[UI自动化失败] search", MatchStrategy::Substring));
        assert!(!page_lists_title(PAGE, "[UI自动化失败] checkout", MatchStrategy::Substring));
    }

    #[test]
    fn test_exact_match_only_counts_bug_links() {
        assert!(page_lists_title(PAGE, "[UI自动化失败] login_test", MatchStrategy::Exact));
        assert!(page_lists_title(
            PAGE,
            "3 [UI自动化失败] login_test_v2 & more",
            MatchStrategy::Exact
        ));
        assert!(!page_lists_title(PAGE, "[UI自动化失败] login_test_v2", MatchStrategy::Exact));
        assert!(!page_lists_title(PAGE, "[UI自动化失败] search", MatchStrategy::Exact));
    }

    #[test]
    fn test_duplicate_check_flags() {
        assert!(DuplicateCheck::Cached.is_duplicate());
        assert!(DuplicateCheck::Found.is_duplicate());
        assert!(!DuplicateCheck::NotFound.is_duplicate());
        assert!(!DuplicateCheck::QueryFailed("timeout".to_string()).is_duplicate());
    }
}
