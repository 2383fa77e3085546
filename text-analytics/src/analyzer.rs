use chrono::{DateTime, Utc};
use threadscope_core::{count_sources, AnalysisConfig, AnalysisResult, Post};
use tracing::info;

use crate::frequency::{common_phrases, common_words};
use crate::normalizer::Normalizer;
use crate::processed::{self, ProcessedResults};
use crate::report::ReportKind;
use crate::sentiment::{tally, SentimentStrategy, ValenceStrategy};
use crate::summary::extractive_summary;

pub const NOTHING_TO_ANALYZE: &str = "No results to analyze.";

#[derive(Debug, Clone, Copy)]
pub struct AnalysisSettings {
    pub top_words: usize,
    pub top_phrases: usize,
    pub summary_sentences: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AnalysisSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            top_words: config.top_words,
            top_phrases: config.top_phrases,
            summary_sentences: config.summary_sentences,
        }
    }
}

/// Entry point for both report kinds. Pure over its input: the same posts
/// always give the same result.
#[derive(Debug, Default)]
pub struct Analyzer {
    normalizer: Normalizer,
    settings: AnalysisSettings,
}

impl Analyzer {
    pub fn new(normalizer: Normalizer, settings: AnalysisSettings) -> Self {
        Self {
            normalizer,
            settings,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(Normalizer::from_config(config), AnalysisSettings::from(config))
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Quick report: word-count sentiment, common words and phrases and an
    /// extractive summary.
    pub fn analyze_results(&self, posts: &[Post]) -> AnalysisResult {
        self.analyze(posts, ReportKind::Quick)
    }

    pub fn analyze(&self, posts: &[Post], kind: ReportKind) -> AnalysisResult {
        self.analyze_with(posts, kind.strategy().as_ref())
    }

    pub fn analyze_with(&self, posts: &[Post], strategy: &dyn SentimentStrategy) -> AnalysisResult {
        if posts.is_empty() {
            return AnalysisResult::empty(NOTHING_TO_ANALYZE);
        }

        info!("Analyzing {} posts with {} sentiment", posts.len(), strategy.name());
        AnalysisResult {
            total_results: posts.len(),
            source_counts: count_sources(posts),
            sentiment: tally(strategy, posts),
            common_words: common_words(posts, &self.normalizer, self.settings.top_words),
            common_phrases: common_phrases(posts, &self.normalizer, self.settings.top_phrases),
            summary: extractive_summary(posts, &self.normalizer, self.settings.summary_sentences),
        }
    }

    /// Full package: valence sentiment per post, word frequencies over posts
    /// and comments, and a narrative summary.
    pub fn process_results(&self, posts: &[Post], search_term: &str) -> ProcessedResults {
        self.process_results_at(posts, search_term, Utc::now())
    }

    pub fn process_results_at(
        &self,
        posts: &[Post],
        search_term: &str,
        now: DateTime<Utc>,
    ) -> ProcessedResults {
        info!("Processing {} posts for '{}'", posts.len(), search_term);
        processed::build(
            posts,
            search_term,
            now,
            &ValenceStrategy::default(),
            &self.normalizer,
            &self.settings,
        )
    }
}
