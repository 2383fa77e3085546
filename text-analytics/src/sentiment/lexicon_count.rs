use std::collections::HashSet;
use threadscope_core::{Post, SentimentCategory};

use super::{PostSentiment, SentimentStrategy};

pub const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "amazing", "awesome", "fantastic", "wonderful", "best", "love",
    "recommend", "positive", "perfect", "helpful", "impressive", "better", "easy", "top",
    "favorite", "satisfied", "worth", "nice", "happy", "reliable", "effective",
];

pub const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "terrible", "awful", "horrible", "worst", "hate", "negative", "difficult",
    "broken", "annoying", "avoid", "disappointing", "issue", "problem", "bug", "error", "crash",
    "slow", "expensive", "overpriced", "useless", "confusing", "fail",
];

/// Counts exact matches of whitespace-separated tokens against fixed word
/// lists. Tokens are not lowercased or stripped, so `Great` and `great!`
/// do not match.
#[derive(Debug, Clone)]
pub struct LexiconCountStrategy {
    positive: HashSet<String>,
    negative: HashSet<String>,
}

impl Default for LexiconCountStrategy {
    fn default() -> Self {
        Self::with_words(POSITIVE_WORDS, NEGATIVE_WORDS)
    }
}

impl LexiconCountStrategy {
    pub fn with_words<S: AsRef<str>>(positive: &[S], negative: &[S]) -> Self {
        Self {
            positive: positive.iter().map(|w| w.as_ref().to_lowercase()).collect(),
            negative: negative.iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    /// `(positive, negative)` match counts.
    pub fn counts(&self, text: &str) -> (usize, usize) {
        text.split_whitespace().fold((0, 0), |(pos, neg), token| {
            (
                pos + usize::from(self.positive.contains(token)),
                neg + usize::from(self.negative.contains(token)),
            )
        })
    }
}

impl SentimentStrategy for LexiconCountStrategy {
    fn name(&self) -> &'static str {
        "lexicon-count"
    }

    fn score(&self, post: &Post) -> PostSentiment {
        let (positive, negative) = self.counts(&post.headline_text());
        let category = match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => SentimentCategory::Positive,
            std::cmp::Ordering::Less => SentimentCategory::Negative,
            std::cmp::Ordering::Equal => SentimentCategory::Neutral,
        };
        PostSentiment::category_only(category)
    }
}
