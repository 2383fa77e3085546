use std::collections::HashSet;
use std::path::Path;
use threadscope_core::{AnalysisConfig, AnalysisError};
use tracing::{info, warn};

/// Standard English stopword list, contractions included.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Lowercase stopword set. Never empty: every constructor falls back to
/// [`ENGLISH_STOPWORDS`].
#[derive(Debug, Clone)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Default for Stopwords {
    fn default() -> Self {
        Self::english()
    }
}

impl Stopwords {
    pub fn english() -> Self {
        Self {
            words: ENGLISH_STOPWORDS.iter().map(|word| word.to_string()).collect(),
        }
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: HashSet<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();

        if words.is_empty() {
            warn!("Custom stopword list is empty, using the English default");
            return Self::english();
        }
        Self { words }
    }

    /// One word per line; blank lines and `#` comments are ignored.
    pub fn from_file(path: &Path) -> Result<Self, AnalysisError> {
        let raw = std::fs::read_to_string(path).map_err(|e| AnalysisError::StopwordsUnavailable {
            reason: format!("{}: {}", path.display(), e),
        })?;

        let words: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        if words.is_empty() {
            return Err(AnalysisError::StopwordsUnavailable {
                reason: format!("{} contains no words", path.display()),
            });
        }
        Ok(Self::from_words(words))
    }

    /// Explicit list first, then the configured file, then the English default.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        if let Some(words) = &config.stopwords {
            return Self::from_words(words);
        }

        if let Some(path) = &config.stopwords_file {
            match Self::from_file(path) {
                Ok(stopwords) => {
                    info!("Loaded {} stopwords from {}", stopwords.len(), path.display());
                    return stopwords;
                }
                Err(e) => warn!("{}, using the English default", e),
            }
        }

        Self::english()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_english_list() {
        let stopwords = Stopwords::english();
        assert_eq!(stopwords.len(), 179);
        assert!(stopwords.contains("the"));
        assert!(stopwords.contains("don't"));
        assert!(!stopwords.contains("rust"));
    }

    #[test]
    fn test_empty_custom_list_falls_back() {
        let stopwords = Stopwords::from_words(Vec::<String>::new());
        assert_eq!(stopwords.len(), ENGLISH_STOPWORDS.len());

        let stopwords = Stopwords::from_words(["  ", ""]);
        assert!(!stopwords.is_empty());
    }

    #[test]
    fn test_custom_list_is_lowercased() {
        let stopwords = Stopwords::from_words(["Foo", " BAR "]);
        assert_eq!(stopwords.len(), 2);
        assert!(stopwords.contains("foo"));
        assert!(stopwords.contains("bar"));
        assert!(!stopwords.contains("the"));
    }

    #[test]
    fn test_config_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# custom words\nalpha\n\nbeta").unwrap();

        let config = AnalysisConfig {
            stopwords_file: Some(file.path().to_path_buf()),
            ..AnalysisConfig::default()
        };
        let from_file = Stopwords::from_config(&config);
        assert_eq!(from_file.len(), 2);
        assert!(from_file.contains("alpha"));

        let config = AnalysisConfig {
            stopwords: Some(vec!["gamma".to_string()]),
            ..config
        };
        assert!(Stopwords::from_config(&config).contains("gamma"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = AnalysisConfig {
            stopwords_file: Some("/nonexistent/stopwords.txt".into()),
            ..AnalysisConfig::default()
        };
        assert_eq!(Stopwords::from_config(&config).len(), 179);
        assert!(matches!(
            Stopwords::from_file(Path::new("/nonexistent/stopwords.txt")),
            Err(AnalysisError::StopwordsUnavailable { .. })
        ));
    }
}
