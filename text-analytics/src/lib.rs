pub mod analyzer;
pub mod frequency;
pub mod normalizer;
pub mod processed;
pub mod report;
pub mod sentiment;
pub mod stopwords;
pub mod summary;
pub mod tokenizer;

pub use analyzer::{AnalysisSettings, Analyzer, NOTHING_TO_ANALYZE};
pub use frequency::{common_phrases, common_words, FrequencyTable};
pub use normalizer::Normalizer;
pub use processed::{ProcessedResults, NO_RESULTS_MESSAGE};
pub use report::{format_results_for_display, generate_text_report, DisplayRow, ReportKind, ReportLimits};
pub use sentiment::{
    LexiconCountStrategy, PolarityScores, PostSentiment, SentimentIntensity, SentimentStrategy,
    ValenceStrategy,
};
pub use stopwords::Stopwords;
pub use summary::extractive_summary;
pub use tokenizer::{RuleTokenizer, Tokenizer};
