use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::time::Instant;
use threadscope_core::{
    Comment, CoreError, ErrorExt, ErrorReporter, Post, RedditConfig, Source, Timeframe,
};
use tracing::{debug, info, warn};

use crate::api::{
    parse_listing, HttpTransport, RedditListingChild, RedditPostData, RedditTransport,
    REDDIT_WEB_BASE,
};
use crate::comments::comments_from_thread;
use crate::metrics::{EndpointKind, FetchMetrics, MetricsCollector, RequestMetrics};

const SEARCH_PATH: &str = "/search.json";
const UNTITLED_POST: &str = "Untitled Post";
const UNKNOWN_COMMUNITY: &str = "Unknown";

/// Bounds on one search invocation.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub page_size: u32,
    pub max_pages: usize,
    pub max_posts: usize,
    pub comment_limit: u32,
    pub comment_concurrency: usize,
}

impl From<&RedditConfig> for SearchSettings {
    fn from(config: &RedditConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages.max(1),
            max_posts: config.max_posts,
            comment_limit: config.comment_limit,
            comment_concurrency: config.comment_concurrency.max(1),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&RedditConfig::default())
    }
}

/// A search item that survived the cutoff and still needs its comments.
#[derive(Debug, Clone)]
struct PendingPost {
    title: String,
    url: String,
    permalink: String,
    community: String,
    date: DateTime<Utc>,
    content: String,
}

/// Keyword search against the public listing API.
///
/// Every failure degrades to fewer results: a failed first page means no
/// posts, a failed second page means first-page posts only, a failed comment
/// fetch means a post without comments.
pub struct RedditSearcher<T> {
    transport: T,
    settings: SearchSettings,
    metrics: MetricsCollector,
    reporter: ErrorReporter,
}

impl RedditSearcher<HttpTransport> {
    pub fn from_config(config: &RedditConfig) -> Result<Self, CoreError> {
        Ok(Self::new(HttpTransport::new(config)?, SearchSettings::from(config)))
    }
}

impl<T: RedditTransport> RedditSearcher<T> {
    pub fn new(transport: T, settings: SearchSettings) -> Self {
        Self {
            transport,
            settings,
            metrics: MetricsCollector::new(),
            reporter: ErrorReporter::new(),
        }
    }

    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub async fn metrics(&self) -> FetchMetrics {
        self.metrics.get_metrics().await
    }

    pub async fn search(&self, keyword: &str, timeframe: Timeframe) -> Vec<Post> {
        self.search_at(keyword, timeframe, Utc::now()).await
    }

    /// Same as [`search`](Self::search) with the cutoff computed from `now`.
    pub async fn search_at(
        &self,
        keyword: &str,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Vec<Post> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            self.reporter.report_warning(&CoreError::InvalidInput {
                message: "search keyword is empty".to_string(),
            });
            return Vec::new();
        }

        info!("Searching Reddit for '{}' within timeframe: {}", keyword, timeframe);
        let cutoff = timeframe.cutoff(now);

        let items = match self.fetch_search_items(keyword, timeframe).await {
            Ok(items) => items,
            Err(e) => {
                self.reporter.report_error(&e);
                return Vec::new();
            }
        };

        let pending: Vec<PendingPost> = items
            .into_iter()
            .take(self.settings.max_posts)
            .filter_map(|item| pending_post(item, cutoff))
            .collect();
        debug!("{} posts inside the timeframe", pending.len());

        // `buffered` runs fetches concurrently but yields in input order.
        let posts: Vec<Post> = stream::iter(pending)
            .map(|pending| self.complete_post(pending))
            .buffered(self.settings.comment_concurrency)
            .collect()
            .await;

        info!("Assembled {} Reddit posts for '{}'", posts.len(), keyword);
        posts
    }

    async fn fetch_search_items(
        &self,
        keyword: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Value>, CoreError> {
        let first = self.fetch_search_page(keyword, timeframe, None).await?;
        let mut items = first.children;
        if items.is_empty() {
            info!("No Reddit posts found");
            return Ok(items);
        }
        info!("Found {} potential Reddit posts", items.len());

        let mut after = first.after;
        for _ in 1..self.settings.max_pages {
            let Some(cursor) = after.take() else {
                break;
            };
            match self.fetch_search_page(keyword, timeframe, Some(&cursor)).await {
                Ok(page) => {
                    info!("Added {} more posts from next page", page.children.len());
                    items.extend(page.children);
                    after = page.after;
                }
                Err(e) => {
                    self.reporter.report_warning(&e);
                    break;
                }
            }
        }

        Ok(items)
    }

    async fn fetch_search_page(
        &self,
        keyword: &str,
        timeframe: Timeframe,
        after: Option<&str>,
    ) -> Result<crate::api::RedditListingData, CoreError> {
        let mut query = vec![
            ("q", keyword.to_string()),
            ("sort", "relevance".to_string()),
            ("t", timeframe.as_str().to_string()),
            ("limit", self.settings.page_size.to_string()),
        ];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }

        let payload = self
            .timed(EndpointKind::SearchPage, SEARCH_PATH, &query)
            .await?;
        Ok(parse_listing(payload, "search results")?.data)
    }

    async fn complete_post(&self, pending: PendingPost) -> Post {
        let comments = self.fetch_comments(&pending.permalink).await;
        Post {
            title: pending.title,
            url: pending.url,
            source: Source::Reddit,
            community: pending.community,
            date: pending.date,
            content: pending.content,
            comments,
        }
    }

    async fn fetch_comments(&self, permalink: &str) -> Vec<Comment> {
        let path = format!("{}.json", permalink);
        let query = [("limit", self.settings.comment_limit.to_string())];

        match self.timed(EndpointKind::Comments, &path, &query).await {
            Ok(payload) => {
                let comments = comments_from_thread(&payload);
                debug!("Retrieved {} comments for {}", comments.len(), permalink);
                comments
            }
            Err(e) => {
                self.reporter.report_warning(&e);
                Vec::new()
            }
        }
    }

    async fn timed(
        &self,
        endpoint: EndpointKind,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, CoreError> {
        let start = Instant::now();
        let result = self.transport.get_json(path, query).await;

        self.metrics
            .record_request(RequestMetrics {
                endpoint,
                response_time: start.elapsed(),
                success: result.is_ok(),
                error_code: result.as_ref().err().map(|e| e.error_code()),
            })
            .await;

        result
    }
}

/// Validate one raw search item. Items older than `cutoff` are skipped, not
/// treated as the end of the listing: relevance order is not chronological.
fn pending_post(item: Value, cutoff: DateTime<Utc>) -> Option<PendingPost> {
    let child: RedditListingChild<RedditPostData> = match serde_json::from_value(item) {
        Ok(child) => child,
        Err(e) => {
            warn!("Skipping malformed search item: {}", e);
            return None;
        }
    };
    let data = child.data;

    let Some(date) = data.created_utc.and_then(timestamp_to_utc) else {
        warn!("Skipping search item without a usable created_utc");
        return None;
    };
    if date < cutoff {
        debug!("Skipping post from {} (cutoff {})", date, cutoff);
        return None;
    }

    let Some(permalink) = data.permalink.filter(|p| !p.is_empty()) else {
        warn!("Skipping search item without a permalink");
        return None;
    };

    let selftext = data.selftext.unwrap_or_default();
    let content = match data.url {
        Some(link) if selftext.is_empty() && !link.is_empty() => format!("Link: {}", link),
        _ => selftext,
    };

    Some(PendingPost {
        title: data.title.unwrap_or_else(|| UNTITLED_POST.to_string()),
        url: format!("{}{}", REDDIT_WEB_BASE, permalink),
        permalink,
        community: data
            .subreddit_name_prefixed
            .unwrap_or_else(|| UNKNOWN_COMMUNITY.to_string()),
        date,
        content,
    })
}

fn timestamp_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    Utc.timestamp_opt(whole, nanos).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_conversion() {
        let date = timestamp_to_utc(1640995200.0).unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap());
        assert!(timestamp_to_utc(f64::NAN).is_none());
    }

    #[test]
    fn test_link_post_gets_link_marker() {
        let cutoff = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let pending = pending_post(
            json!({"kind": "t3", "data": {
                "title": "A link",
                "permalink": "/r/rust/comments/abc/a_link/",
                "subreddit_name_prefixed": "r/rust",
                "created_utc": 1640995200.0,
                "selftext": "",
                "url": "https://example.com/article"
            }}),
            cutoff,
        )
        .unwrap();

        assert_eq!(pending.content, "Link: https://example.com/article");
        assert_eq!(
            pending.url,
            "https://www.reddit.com/r/rust/comments/abc/a_link/"
        );
        assert_eq!(pending.community, "r/rust");
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let cutoff = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let pending = pending_post(
            json!({"data": {"permalink": "/r/x/comments/1/", "created_utc": 1640995200}}),
            cutoff,
        )
        .unwrap();
        assert_eq!(pending.title, "Untitled Post");
        assert_eq!(pending.community, "Unknown");
        assert_eq!(pending.content, "");
    }

    #[test]
    fn test_unusable_items_are_skipped() {
        let cutoff = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert!(pending_post(json!({"data": {"permalink": "/r/x/1/"}}), cutoff).is_none());
        assert!(pending_post(json!({"data": {"created_utc": 1640995200.0}}), cutoff).is_none());
        assert!(pending_post(json!({"data": {"title": 7}}), cutoff).is_none());
        assert!(pending_post(
            json!({"data": {"permalink": "/r/x/1/", "created_utc": 900000000.0}}),
            cutoff
        )
        .is_none());
    }
}
