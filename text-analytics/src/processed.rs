//! Full analysis package produced after a search has been persisted:
//! per-post valence detail, corpus word frequencies and a short narrative.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use threadscope_core::{count_sources, Post, SentimentCategory};

use crate::analyzer::AnalysisSettings;
use crate::frequency::FrequencyTable;
use crate::normalizer::{Normalizer, MIN_TOKEN_CHARS};
use crate::sentiment::SentimentStrategy;

pub const NO_RESULTS_MESSAGE: &str = "No results found for the given search term and timeframe.";

const NARRATIVE_ITEMS: usize = 5;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("non-word regex"));

/// A fetched post tagged with its position in the result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    /// 1-based.
    pub id: usize,
    pub search_term: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub post: Post,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentDetail {
    pub id: usize,
    pub title: String,
    pub compound: f64,
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    pub category: SentimentCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub average_compound: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub details: Vec<SentimentDetail>,
    pub summary: SentimentSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub common_words: Vec<(String, usize)>,
    pub common_phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAnalysis {
    pub sentiment: SentimentReport,
    pub word_frequency: WordFrequency,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessedResults {
    Empty {
        total_results: usize,
        message: String,
    },
    Complete {
        processed_data: Vec<ProcessedRecord>,
        analysis: ProcessedAnalysis,
    },
}

impl ProcessedResults {
    pub fn empty() -> Self {
        ProcessedResults::Empty {
            total_results: 0,
            message: NO_RESULTS_MESSAGE.to_string(),
        }
    }

    pub fn total_results(&self) -> usize {
        match self {
            ProcessedResults::Empty { total_results, .. } => *total_results,
            ProcessedResults::Complete { processed_data, .. } => processed_data.len(),
        }
    }

    /// The narrative summary, or the empty-result message.
    pub fn narrative(&self) -> &str {
        match self {
            ProcessedResults::Empty { message, .. } => message,
            ProcessedResults::Complete { analysis, .. } => &analysis.summary,
        }
    }
}

pub(crate) fn build(
    posts: &[Post],
    search_term: &str,
    now: DateTime<Utc>,
    strategy: &dyn SentimentStrategy,
    normalizer: &Normalizer,
    settings: &AnalysisSettings,
) -> ProcessedResults {
    if posts.is_empty() {
        return ProcessedResults::empty();
    }

    let processed_data: Vec<ProcessedRecord> = posts
        .iter()
        .enumerate()
        .map(|(index, post)| ProcessedRecord {
            id: index + 1,
            search_term: search_term.to_string(),
            created_at: now,
            post: post.clone(),
        })
        .collect();

    let sentiment = sentiment_report(&processed_data, strategy);
    let word_frequency = word_frequency(posts, normalizer, settings);
    let summary = narrative(posts, &sentiment.summary, &word_frequency);

    ProcessedResults::Complete {
        processed_data,
        analysis: ProcessedAnalysis {
            sentiment,
            word_frequency,
            summary,
        },
    }
}

fn sentiment_report(records: &[ProcessedRecord], strategy: &dyn SentimentStrategy) -> SentimentReport {
    let details: Vec<SentimentDetail> = records
        .iter()
        .map(|record| {
            let sentiment = strategy.score(&record.post);
            let scores = sentiment.scores.unwrap_or_default();
            SentimentDetail {
                id: record.id,
                title: record.post.title.clone(),
                compound: scores.compound,
                positive: scores.positive,
                negative: scores.negative,
                neutral: scores.neutral,
                category: sentiment.category,
            }
        })
        .collect();

    let count = |category: SentimentCategory| {
        details
            .iter()
            .filter(|detail| detail.category == category)
            .count()
    };
    let average_compound = if details.is_empty() {
        0.0
    } else {
        details.iter().map(|detail| detail.compound).sum::<f64>() / details.len() as f64
    };

    let summary = SentimentSummary {
        total: details.len(),
        positive: count(SentimentCategory::Positive),
        negative: count(SentimentCategory::Negative),
        neutral: count(SentimentCategory::Neutral),
        average_compound,
    };
    SentimentReport { details, summary }
}

/// Lowercase, drop every non-word character, split on whitespace.
fn clean_words(text: &str) -> Vec<String> {
    NON_WORD
        .replace_all(&text.to_lowercase(), "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn word_frequency(
    posts: &[Post],
    normalizer: &Normalizer,
    settings: &AnalysisSettings,
) -> WordFrequency {
    let mut all_text = String::new();
    for post in posts {
        all_text.push(' ');
        all_text.push_str(&post.content);
        for body in post.comment_bodies() {
            all_text.push(' ');
            all_text.push_str(body);
        }
    }

    let words: Vec<String> = clean_words(&all_text)
        .into_iter()
        .filter(|word| !normalizer.is_stopword(word) && word.chars().count() >= MIN_TOKEN_CHARS)
        .collect();

    let common_words = words.iter().collect::<FrequencyTable>().most_common(settings.top_words);
    let common_phrases = words
        .windows(2)
        .map(|pair| pair.join(" "))
        .collect::<FrequencyTable>()
        .most_common(settings.top_phrases)
        .into_iter()
        .map(|(phrase, _)| phrase)
        .collect();

    WordFrequency {
        common_words,
        common_phrases,
    }
}

fn narrative(posts: &[Post], sentiment: &SentimentSummary, frequency: &WordFrequency) -> String {
    let sources = count_sources(posts)
        .iter()
        .map(|(source, count)| format!("{} from {}", count, source))
        .collect::<Vec<_>>()
        .join(", ");
    let words: Vec<&str> = frequency
        .common_words
        .iter()
        .take(NARRATIVE_ITEMS)
        .map(|(word, _)| word.as_str())
        .collect();
    let phrases: Vec<&str> = frequency
        .common_phrases
        .iter()
        .take(NARRATIVE_ITEMS)
        .map(String::as_str)
        .collect();

    let mut lines = vec![
        format!("Analysis of {} results for the search term.", posts.len()),
        format!("Sources: {}.", sources),
        format!(
            "Sentiment analysis: {} positive, {} negative, and {} neutral results.",
            sentiment.positive, sentiment.negative, sentiment.neutral
        ),
        format!("Most common words: {}.", words.join(", ")),
    ];
    if !phrases.is_empty() {
        lines.push(format!("Common phrases: {}.", phrases.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_words() {
        assert_eq!(
            clean_words("Don't STOP-me now, it's snake_case!"),
            vec!["dont", "stopme", "now", "its", "snake_case"]
        );
        assert_eq!(clean_words("Café, naïve: 42%"), vec!["café", "naïve", "42"]);
    }

    #[test]
    fn test_word_frequency_follows_settings() {
        let post = Post {
            title: "Tools".to_string(),
            url: "https://www.reddit.com/r/test/comments/1/tools/".to_string(),
            source: threadscope_core::Source::Reddit,
            community: "r/test".to_string(),
            date: Utc::now(),
            content: "alpha bravo charlie delta echo foxtrot".to_string(),
            comments: Vec::new(),
        };
        let settings = AnalysisSettings {
            top_words: 3,
            top_phrases: 2,
            summary_sentences: 10,
        };

        let frequency = word_frequency(&[post], &Normalizer::default(), &settings);
        assert_eq!(frequency.common_words.len(), 3);
        assert_eq!(frequency.common_words[0], ("alpha".to_string(), 1));
        assert_eq!(frequency.common_phrases, vec!["alpha bravo", "bravo charlie"]);
    }
}
