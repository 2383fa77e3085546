//! Rule-based valence scoring in the style of VADER: an embedded word
//! lexicon adjusted for intensifiers, negation, contrastive "but",
//! capitalisation and trailing `!`/`?` runs.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use threadscope_core::{Post, SentimentCategory};
use tracing::warn;

use super::{PolarityScores, PostSentiment, SentimentStrategy};

const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
const ALPHA: f64 = 15.0;

const POSITIVE_THRESHOLD: f64 = 0.05;
const NEGATIVE_THRESHOLD: f64 = -0.05;

static LEXICON: Lazy<HashMap<&'static str, f64>> =
    Lazy::new(|| parse_lexicon(include_str!("valence_lexicon.txt")));

const BOOSTERS: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerable", "considerably",
    "decidedly", "deeply", "enormous", "enormously", "entirely", "especially", "exceptional",
    "exceptionally", "extreme", "extremely", "fabulously", "flipping", "fully", "greatly",
    "hella", "highly", "hugely", "incredible", "incredibly", "intensely", "major", "majorly",
    "more", "most", "particularly", "purely", "quite", "really", "remarkably", "so",
    "substantially", "thoroughly", "total", "totally", "tremendous", "tremendously", "uber",
    "unbelievably", "unusually", "utter", "utterly", "very",
];

const DAMPENERS: &[&str] = &[
    "almost", "barely", "hardly", "kinda", "kindof", "kind-of", "less", "little", "marginal",
    "marginally", "occasional", "occasionally", "partly", "scarce", "scarcely", "slight",
    "slightly", "somewhat", "sorta", "sortof", "sort-of",
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "dont", "hadnt",
    "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither", "neednt", "never", "none", "nope",
    "nor", "not", "nothing", "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "uh-uh", "wasnt",
    "werent", "without", "wont", "wouldnt", "rarely", "seldom", "despite",
];

fn parse_lexicon(raw: &'static str) -> HashMap<&'static str, f64> {
    raw.lines()
        .filter_map(|line| {
            let (word, value) = line.split_once('\t')?;
            match value.trim().parse::<f64>() {
                Ok(value) => Some((word.trim(), value)),
                Err(_) => {
                    warn!("Skipping malformed lexicon line: {}", line);
                    None
                }
            }
        })
        .collect()
}

fn booster_scalar(word: &str) -> Option<f64> {
    if BOOSTERS.contains(&word) {
        Some(B_INCR)
    } else if DAMPENERS.contains(&word) {
        Some(B_DECR)
    } else {
        None
    }
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.contains("n't")
}

/// Has a cased letter and no lowercase ones.
fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

/// Strips surrounding punctuation unless that would leave two characters or
/// fewer, which keeps emoticons such as `:)` intact.
fn strip_punctuation_if_word(token: &str) -> &str {
    let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
    if stripped.chars().count() <= 2 {
        token
    } else {
        stripped
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

struct SentiText {
    words: Vec<String>,
    lower: Vec<String>,
    cap_differential: bool,
}

impl SentiText {
    fn new(text: &str) -> Self {
        let words: Vec<String> = text
            .split_whitespace()
            .map(strip_punctuation_if_word)
            .filter(|word| word.chars().count() > 1)
            .map(str::to_string)
            .collect();
        let lower = words.iter().map(|word| word.to_lowercase()).collect();

        let caps = words.iter().filter(|word| is_all_caps(word)).count();
        Self {
            cap_differential: caps > 0 && caps < words.len(),
            words,
            lower,
        }
    }

    fn lower_at(&self, i: usize) -> &str {
        &self.lower[i]
    }
}

/// Valence scorer backed by the embedded lexicon.
#[derive(Debug, Clone, Copy)]
pub struct SentimentIntensity {
    lexicon: &'static HashMap<&'static str, f64>,
}

impl Default for SentimentIntensity {
    fn default() -> Self {
        Self { lexicon: &LEXICON }
    }
}

impl SentimentIntensity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lexicon_len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let senti = SentiText::new(text);
        let mut sentiments = Vec::with_capacity(senti.words.len());

        for i in 0..senti.words.len() {
            let word = senti.lower_at(i);
            let kind_of = word == "kind" && senti.lower.get(i + 1).is_some_and(|next| next == "of");
            if booster_scalar(word).is_some() || kind_of {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.valence_at(&senti, i));
        }

        apply_but_rule(&senti.lower, &mut sentiments);
        score_valence(&sentiments, text)
    }

    fn in_lexicon(&self, word: &str) -> bool {
        self.lexicon.contains_key(word)
    }

    fn valence_at(&self, senti: &SentiText, i: usize) -> f64 {
        let word = senti.lower_at(i);
        let Some(&base) = self.lexicon.get(word) else {
            return 0.0;
        };
        let mut valence = base;

        // "no" directly before a lexicon word acts as a negator, not a word.
        if word == "no" && senti.lower.get(i + 1).is_some_and(|next| self.in_lexicon(next)) {
            valence = 0.0;
        }
        let after_no = (i > 0 && senti.lower_at(i - 1) == "no")
            || (i > 1 && senti.lower_at(i - 2) == "no")
            || (i > 2
                && senti.lower_at(i - 3) == "no"
                && matches!(senti.lower_at(i - 1), "or" | "nor"));
        if after_no {
            valence *= N_SCALAR;
        }

        if is_all_caps(&senti.words[i]) && senti.cap_differential {
            valence += if valence > 0.0 { C_INCR } else { -C_INCR };
        }

        for distance in 1..=3 {
            if i < distance {
                break;
            }
            let j = i - distance;
            if self.in_lexicon(senti.lower_at(j)) {
                continue;
            }

            let mut scalar = scalar_inc_dec(senti, j, valence);
            scalar *= match distance {
                2 => 0.95,
                3 => 0.9,
                _ => 1.0,
            };
            valence += scalar;
            valence = negation_check(senti, i, distance, valence);
        }

        self.least_check(senti, i, valence)
    }

    fn least_check(&self, senti: &SentiText, i: usize, valence: f64) -> f64 {
        if i > 1 && !self.in_lexicon(senti.lower_at(i - 1)) && senti.lower_at(i - 1) == "least" {
            if !matches!(senti.lower_at(i - 2), "at" | "very") {
                return valence * N_SCALAR;
            }
        } else if i > 0
            && !self.in_lexicon(senti.lower_at(i - 1))
            && senti.lower_at(i - 1) == "least"
        {
            return valence * N_SCALAR;
        }
        valence
    }
}

fn scalar_inc_dec(senti: &SentiText, j: usize, valence: f64) -> f64 {
    let Some(mut scalar) = booster_scalar(senti.lower_at(j)) else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar = -scalar;
    }
    if is_all_caps(&senti.words[j]) && senti.cap_differential {
        scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
    }
    scalar
}

fn negation_check(senti: &SentiText, i: usize, distance: usize, valence: f64) -> f64 {
    let never_so = |k: usize| {
        senti.lower_at(i - k) == "never"
            && (1..k).any(|m| matches!(senti.lower_at(i - m), "so" | "this"))
    };

    if distance > 1 && never_so(distance) {
        valence * 1.25
    } else if is_negation(senti.lower_at(i - distance)) {
        valence * N_SCALAR
    } else {
        valence
    }
}

/// Words before "but" count half, words after it half again.
fn apply_but_rule(lower: &[String], sentiments: &mut [f64]) {
    let Some(but) = lower.iter().position(|word| word == "but") else {
        return;
    };
    for (index, sentiment) in sentiments.iter_mut().enumerate() {
        if index < but {
            *sentiment *= 0.5;
        } else if index > but {
            *sentiment *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * 0.292;
    let questions = match text.matches('?').count() {
        0 | 1 => 0.0,
        n @ 2..=3 => n as f64 * 0.18,
        _ => 0.96,
    };
    exclamations + questions
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn score_valence(sentiments: &[f64], text: &str) -> PolarityScores {
    if sentiments.is_empty() {
        return PolarityScores::default();
    }

    let emphasis = punctuation_emphasis(text);
    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }

    let mut positive_sum = 0.0;
    let mut negative_sum = 0.0;
    let mut neutral_count = 0.0;
    for &sentiment in sentiments {
        if sentiment > 0.0 {
            positive_sum += sentiment + 1.0;
        } else if sentiment < 0.0 {
            negative_sum += sentiment - 1.0;
        } else {
            neutral_count += 1.0;
        }
    }

    if positive_sum > negative_sum.abs() {
        positive_sum += emphasis;
    } else if positive_sum < negative_sum.abs() {
        negative_sum -= emphasis;
    }

    let total = positive_sum + negative_sum.abs() + neutral_count;
    PolarityScores {
        compound: round_to(normalize(sum), 4),
        positive: round_to((positive_sum / total).abs(), 3),
        negative: round_to((negative_sum / total).abs(), 3),
        neutral: round_to((neutral_count / total).abs(), 3),
    }
}

pub fn category_for(compound: f64) -> SentimentCategory {
    if compound >= POSITIVE_THRESHOLD {
        SentimentCategory::Positive
    } else if compound <= NEGATIVE_THRESHOLD {
        SentimentCategory::Negative
    } else {
        SentimentCategory::Neutral
    }
}

/// Scores a post's body together with every comment and reply beneath it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValenceStrategy {
    analyzer: SentimentIntensity,
}

impl ValenceStrategy {
    pub fn post_text(post: &Post) -> String {
        std::iter::once(post.content.as_str())
            .chain(post.comment_bodies())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl SentimentStrategy for ValenceStrategy {
    fn name(&self) -> &'static str {
        "valence"
    }

    fn score(&self, post: &Post) -> PostSentiment {
        let scores = self.analyzer.polarity_scores(&Self::post_text(post));
        PostSentiment {
            category: category_for(scores.compound),
            scores: Some(scores),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(text: &str) -> f64 {
        SentimentIntensity::new().polarity_scores(text).compound
    }

    #[test]
    fn test_lexicon_loads() {
        let analyzer = SentimentIntensity::new();
        assert!(analyzer.lexicon_len() > 300);
        assert_eq!(LEXICON.get("great"), Some(&3.1));
    }

    #[test]
    fn test_single_word() {
        let scores = SentimentIntensity::new().polarity_scores("great");
        assert_eq!(scores.compound, 0.6249);
        assert_eq!(scores.positive, 1.0);
        assert_eq!(scores.negative, 0.0);
        assert_eq!(scores.neutral, 0.0);
    }

    #[test]
    fn test_no_lexicon_words() {
        let scores = SentimentIntensity::new().polarity_scores("the table is brown");
        assert_eq!(scores.compound, 0.0);
        assert_eq!(scores.neutral, 1.0);
        assert_eq!(
            SentimentIntensity::new().polarity_scores(""),
            PolarityScores::default()
        );
    }

    #[test]
    fn test_negation_flips() {
        assert!(compound("this is good") > 0.0);
        assert!(compound("this is not good") < 0.0);
        assert!(compound("this isn't good") < 0.0);
    }

    #[test]
    fn test_intensifiers() {
        assert!(compound("very good") > compound("good"));
        assert!(compound("slightly good") < compound("good"));
        assert!(compound("good!!!") > compound("good"));
        assert!(compound("GOOD movie") > compound("good movie"));
    }

    #[test]
    fn test_but_shifts_weight() {
        assert!(compound("The food is good but the service is terrible") < 0.0);
        assert!(compound("The food is terrible but the service is good") > 0.0);
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(category_for(0.05), SentimentCategory::Positive);
        assert_eq!(category_for(0.0499), SentimentCategory::Neutral);
        assert_eq!(category_for(-0.05), SentimentCategory::Negative);
    }
}
