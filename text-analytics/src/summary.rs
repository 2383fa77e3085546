use std::collections::HashMap;
use threadscope_core::Post;

use crate::frequency::FrequencyTable;
use crate::normalizer::Normalizer;

/// Extractive summary of the post bodies.
///
/// With `max_sentences` or fewer sentences the body text is returned as is,
/// sentences joined by single spaces. Otherwise each distinct sentence is
/// scored by the summed corpus frequency of its words and the best
/// `max_sentences` are joined in score order.
pub fn extractive_summary(posts: &[Post], normalizer: &Normalizer, max_sentences: usize) -> String {
    let sentences: Vec<String> = posts
        .iter()
        .flat_map(|post| normalizer.tokenize_sentences(&post.content))
        .collect();

    if sentences.len() <= max_sentences {
        return sentences.join(" ");
    }

    let frequencies: FrequencyTable = normalizer
        .significant_words(&sentences.join(" "))
        .into_iter()
        .collect();

    // Repeated sentences share one entry and accumulate their scores.
    // Sentences without a single counted word get no entry.
    let mut scores = SentenceScores::default();
    for sentence in &sentences {
        for word in normalizer.tokenize_words(sentence) {
            let weight = frequencies.get(&word);
            if weight > 0 {
                scores.add(sentence, weight);
            }
        }
    }

    scores.top(max_sentences).join(" ")
}

/// Scores in first-seen order, indexed by sentence text.
#[derive(Default)]
struct SentenceScores<'a> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, usize)>,
}

impl<'a> SentenceScores<'a> {
    fn add(&mut self, sentence: &'a str, weight: usize) {
        match self.index.get(sentence) {
            Some(&position) => self.entries[position].1 += weight,
            None => {
                self.index.insert(sentence, self.entries.len());
                self.entries.push((sentence, weight));
            }
        }
    }

    fn top(mut self, n: usize) -> Vec<&'a str> {
        self.entries.sort_by(|a, b| b.1.cmp(&a.1));
        self.entries
            .into_iter()
            .take(n)
            .map(|(sentence, _)| sentence)
            .collect()
    }
}
