use threadscope_core::AnalysisConfig;
use tracing::warn;

use crate::stopwords::Stopwords;
use crate::tokenizer::{fallback_sentences, fallback_words, RuleTokenizer, Tokenizer};

/// Tokens of this many characters or fewer never reach a frequency table.
pub const MIN_TOKEN_CHARS: usize = 3;

/// Text segmentation and filtering shared by every analysis. Tokenizer
/// errors are absorbed here: callers always get tokens back.
pub struct Normalizer {
    tokenizer: Box<dyn Tokenizer>,
    stopwords: Stopwords,
}

impl Normalizer {
    pub fn new(stopwords: Stopwords) -> Self {
        Self::with_tokenizer(RuleTokenizer::default(), stopwords)
    }

    pub fn with_tokenizer(tokenizer: impl Tokenizer + 'static, stopwords: Stopwords) -> Self {
        Self {
            tokenizer: Box::new(tokenizer),
            stopwords,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::with_tokenizer(
            RuleTokenizer::new(config.max_tokenizer_input),
            Stopwords::from_config(config),
        )
    }

    pub fn stopwords(&self) -> &Stopwords {
        &self.stopwords
    }

    /// Lowercase word and punctuation tokens.
    pub fn tokenize_words(&self, text: &str) -> Vec<String> {
        let tokens = self.tokenizer.words(text).unwrap_or_else(|e| {
            warn!("{}, falling back to whitespace splitting", e);
            fallback_words(text)
        });
        tokens.into_iter().map(|token| token.to_lowercase()).collect()
    }

    pub fn tokenize_sentences(&self, text: &str) -> Vec<String> {
        self.tokenizer.sentences(text).unwrap_or_else(|e| {
            warn!("{}, falling back to period splitting", e);
            fallback_sentences(text)
        })
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    /// Trims punctuation from both ends; an all-punctuation token becomes "".
    pub fn strip_punctuation(token: &str) -> &str {
        token.trim_matches(|c: char| is_punctuation_char(c))
    }

    pub fn is_punctuation(token: &str) -> bool {
        !token.is_empty() && token.chars().all(is_punctuation_char)
    }

    /// Lowercase tokens with stopwords, punctuation and short tokens removed.
    pub fn content_words(&self, text: &str) -> Vec<String> {
        self.tokenize_words(text)
            .iter()
            .map(|token| Self::strip_punctuation(token))
            .filter(|token| {
                token.chars().count() >= MIN_TOKEN_CHARS && !self.is_stopword(token)
            })
            .map(str::to_string)
            .collect()
    }

    /// Lowercase tokens with stopwords and punctuation removed, short tokens
    /// kept.
    pub fn significant_words(&self, text: &str) -> Vec<String> {
        self.tokenize_words(text)
            .into_iter()
            .filter(|token| !Self::is_punctuation(token) && !self.is_stopword(token))
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Stopwords::english())
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

fn is_punctuation_char(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_are_lowercased() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.tokenize_words("Great PRODUCT!"),
            vec!["great", "product", "!"]
        );
    }

    #[test]
    fn test_strip_punctuation() {
        assert_eq!(Normalizer::strip_punctuation("\"hello!\""), "hello");
        assert_eq!(Normalizer::strip_punctuation("..."), "");
        assert_eq!(Normalizer::strip_punctuation("don't"), "don't");
        assert!(Normalizer::is_punctuation("?!"));
        assert!(!Normalizer::is_punctuation("a!"));
        assert!(!Normalizer::is_punctuation(""));
    }

    #[test]
    fn test_content_words_filters() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.content_words("The Rust compiler is so fast, and I love it!"),
            vec!["rust", "compiler", "fast", "love"]
        );
    }

    #[test]
    fn test_significant_words_keep_short_tokens() {
        let normalizer = Normalizer::default();
        assert_eq!(
            normalizer.significant_words("Go is ok."),
            vec!["go", "ok"]
        );
    }
}
