use threadscope_core::AnalysisError;

/// Word and sentence segmentation. Implementations may refuse input; the
/// [`Normalizer`](crate::Normalizer) recovers with naive splitting.
pub trait Tokenizer: Send + Sync {
    fn words(&self, text: &str) -> Result<Vec<String>, AnalysisError>;
    fn sentences(&self, text: &str) -> Result<Vec<String>, AnalysisError>;
}

const ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "etc.", "vs.", "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.",
    "approx.", "no.", "fig.", "inc.", "ltd.", "co.",
];

/// Characters allowed inside a word when surrounded by alphanumerics.
fn is_joiner(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}' | '-' | '.' | '_')
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

/// Rule-based tokenizer.
///
/// Words are runs of alphanumerics that may contain joiners (`don't`,
/// `well-known`, `v1.2`); every other non-space character is its own token.
/// Sentences end after a run of `.`, `!` or `?` followed by whitespace,
/// unless the run closes a known abbreviation, and at blank lines.
#[derive(Debug, Clone)]
pub struct RuleTokenizer {
    max_input: usize,
}

impl RuleTokenizer {
    pub fn new(max_input: usize) -> Self {
        Self { max_input }
    }

    fn check_length(&self, text: &str) -> Result<(), AnalysisError> {
        if text.len() > self.max_input {
            return Err(AnalysisError::TokenizationFailed {
                text_length: text.len(),
            });
        }
        Ok(())
    }
}

impl Default for RuleTokenizer {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}

impl Tokenizer for RuleTokenizer {
    fn words(&self, text: &str) -> Result<Vec<String>, AnalysisError> {
        self.check_length(text)?;

        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if c.is_alphanumeric() {
                current.push(c);
                continue;
            }

            let next_is_word = chars.get(i + 1).is_some_and(|n| n.is_alphanumeric());
            if is_joiner(c) && !current.is_empty() && next_is_word {
                current.push(c);
                continue;
            }

            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        }

        if !current.is_empty() {
            tokens.push(current);
        }
        Ok(tokens)
    }

    fn sentences(&self, text: &str) -> Result<Vec<String>, AnalysisError> {
        self.check_length(text)?;

        let mut sentences = Vec::new();
        for block in split_blank_lines(text) {
            split_block(block, &mut sentences);
        }
        Ok(sentences)
    }
}

fn split_blank_lines(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    let mut previous_blank = false;

    for line in text.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        if blank && !previous_blank {
            blocks.push(&text[start..offset]);
        }
        if !blank && previous_blank {
            start = offset;
        }
        previous_blank = blank;
        offset += line.len();
    }
    if !previous_blank {
        blocks.push(&text[start..]);
    }
    blocks
}

fn split_block(block: &str, out: &mut Vec<String>) {
    let chars: Vec<(usize, char)> = block.char_indices().collect();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (_, c) = chars[i];
        if !is_terminator(c) {
            i += 1;
            continue;
        }

        let mut end = i;
        while end + 1 < chars.len() && is_terminator(chars[end + 1].1) {
            end += 1;
        }
        let single_period = c == '.' && end == i;
        while end + 1 < chars.len() && is_closer(chars[end + 1].1) {
            end += 1;
        }

        let boundary = chars.get(end + 1).map_or(block.len(), |(pos, _)| *pos);
        let at_space = chars.get(end + 1).map_or(true, |(_, n)| n.is_whitespace());

        if at_space && !(single_period && ends_with_abbreviation(&block[start..boundary])) {
            push_sentence(&block[start..boundary], out);
            start = boundary;
        }
        i = end + 1;
    }

    push_sentence(&block[start..], out);
}

fn ends_with_abbreviation(candidate: &str) -> bool {
    let last = candidate
        .split_whitespace()
        .last()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    ABBREVIATIONS.contains(&last.as_str())
}

fn push_sentence(raw: &str, out: &mut Vec<String>) {
    let sentence = raw.trim();
    if !sentence.is_empty() {
        out.push(sentence.to_string());
    }
}

/// Whitespace splitting, used when a tokenizer refuses input.
pub fn fallback_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Period splitting, used when a tokenizer refuses input.
pub fn fallback_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        RuleTokenizer::default().words(text).unwrap()
    }

    fn sentences(text: &str) -> Vec<String> {
        RuleTokenizer::default().sentences(text).unwrap()
    }

    #[test]
    fn test_word_tokens() {
        assert_eq!(
            words("Don't panic, it's well-known (v1.2)!"),
            vec!["Don't", "panic", ",", "it's", "well-known", "(", "v1.2", ")", "!"]
        );
        assert_eq!(words("end."), vec!["end", "."]);
        assert_eq!(words("  "), Vec::<String>::new());
        assert_eq!(words("'quoted'"), vec!["'", "quoted", "'"]);
    }

    #[test]
    fn test_sentence_split() {
        assert_eq!(
            sentences("First one. Second one! Third?? Fourth"),
            vec!["First one.", "Second one!", "Third??", "Fourth"]
        );
        assert_eq!(
            sentences("Use tools e.g. cargo. Then test."),
            vec!["Use tools e.g. cargo.", "Then test."]
        );
        assert_eq!(sentences("Version 1.2 is out. Nice."), vec!["Version 1.2 is out.", "Nice."]);
    }

    #[test]
    fn test_blank_lines_end_sentences() {
        assert_eq!(
            sentences("Heading without stop\n\nBody text here.\n  \n\nLast"),
            vec!["Heading without stop", "Body text here.", "Last"]
        );
        assert!(sentences("").is_empty());
        assert!(sentences("\n\n \n").is_empty());
    }

    #[test]
    fn test_quoted_terminator() {
        assert_eq!(
            sentences("He said \"stop.\" Then left."),
            vec!["He said \"stop.\"", "Then left."]
        );
    }

    #[test]
    fn test_input_limit() {
        let tokenizer = RuleTokenizer::new(5);
        assert_eq!(
            tokenizer.words("longer than five"),
            Err(AnalysisError::TokenizationFailed { text_length: 16 })
        );
        assert!(tokenizer.sentences("short").is_ok());
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(fallback_words(" a  b\tc "), vec!["a", "b", "c"]);
        assert_eq!(fallback_sentences("One. Two.. Three"), vec!["One", "Two", "Three"]);
    }
}
