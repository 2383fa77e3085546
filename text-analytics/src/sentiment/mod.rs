//! Post-level sentiment. Two interchangeable strategies sit behind
//! [`SentimentStrategy`]: a quick positive/negative word count and a
//! valence-lexicon model that also reads the comment tree.

pub mod lexicon_count;
pub mod valence;

pub use lexicon_count::LexiconCountStrategy;
pub use valence::{SentimentIntensity, ValenceStrategy};

use serde::{Deserialize, Serialize};
use threadscope_core::{Post, SentimentCategory, SentimentCounts};
use tracing::debug;

/// Valence-model scores for one text. `compound` is in [-1, 1]; the three
/// proportions sum to roughly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    pub compound: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostSentiment {
    pub category: SentimentCategory,
    /// Only strategies with a continuous score fill this in.
    pub scores: Option<PolarityScores>,
}

impl PostSentiment {
    pub fn category_only(category: SentimentCategory) -> Self {
        Self {
            category,
            scores: None,
        }
    }
}

pub trait SentimentStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, post: &Post) -> PostSentiment;
}

/// Category counts over all posts.
pub fn tally(strategy: &dyn SentimentStrategy, posts: &[Post]) -> SentimentCounts {
    let mut counts = SentimentCounts::default();
    for post in posts {
        counts.record(strategy.score(post).category);
    }
    debug!(
        "{} sentiment: {} positive, {} neutral, {} negative",
        strategy.name(),
        counts.positive,
        counts.neutral,
        counts.negative
    );
    counts
}
