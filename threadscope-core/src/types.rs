use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Platform a post was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    Reddit,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Reddit => "Reddit",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reddit" => Ok(Source::Reddit),
            other => Err(CoreError::InvalidInput {
                message: format!("unknown source '{}'", other),
            }),
        }
    }
}

/// Coarse recency filter applied to post creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    Month,
    Year,
    All,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Year,
        Timeframe::All,
    ];

    /// Oldest creation time still inside the window, relative to `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Timeframe::Week => now - Duration::days(7),
            Timeframe::Month => now - Duration::days(30),
            Timeframe::Year => now - Duration::days(365),
            Timeframe::All => all_time_floor(),
        }
    }

    /// Value of the `t` query parameter on the search endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Year => "year",
            Timeframe::All => "all",
        }
    }
}

fn all_time_floor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "year" => Ok(Timeframe::Year),
            "all" => Ok(Timeframe::All),
            other => Err(CoreError::InvalidInput {
                message: format!("timeframe must be week, month, year or all, got '{}'", other),
            }),
        }
    }
}

/// One message in a discussion thread. Owns its replies; the tree mirrors the
/// acyclic source payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub score: i64,
    pub body: String,
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Number of comments in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.replies.iter().map(Comment::subtree_len).sum::<usize>()
    }

    fn collect_bodies<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.body);
        for reply in &self.replies {
            reply.collect_bodies(out);
        }
    }
}

/// One fetched discussion item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    pub url: String,
    pub source: Source,
    pub community: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn total_comments(&self) -> usize {
        self.comments.iter().map(Comment::subtree_len).sum()
    }

    /// Every comment and reply body in the tree, depth first.
    pub fn comment_bodies(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for comment in &self.comments {
            comment.collect_bodies(&mut out);
        }
        out
    }

    /// Title and body joined by a single space.
    pub fn headline_text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentCategory {
    Positive,
    Neutral,
    Negative,
}

impl SentimentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentCategory::Positive => "positive",
            SentimentCategory::Neutral => "neutral",
            SentimentCategory::Negative => "negative",
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentCounts {
    pub fn record(&mut self, category: SentimentCategory) {
        match category {
            SentimentCategory::Positive => self.positive += 1,
            SentimentCategory::Neutral => self.neutral += 1,
            SentimentCategory::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// Derived view over a result set; recomputed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_results: usize,
    #[serde(rename = "sources")]
    pub source_counts: BTreeMap<Source, usize>,
    pub sentiment: SentimentCounts,
    pub common_words: Vec<(String, usize)>,
    pub common_phrases: Vec<(String, usize)>,
    pub summary: String,
}

impl AnalysisResult {
    pub fn empty(summary: impl Into<String>) -> Self {
        Self {
            total_results: 0,
            source_counts: BTreeMap::new(),
            sentiment: SentimentCounts::default(),
            common_words: Vec::new(),
            common_phrases: Vec::new(),
            summary: summary.into(),
        }
    }
}

pub fn count_sources(posts: &[Post]) -> BTreeMap<Source, usize> {
    let mut counts = BTreeMap::new();
    for post in posts {
        *counts.entry(post.source).or_insert(0) += 1;
    }
    counts
}
