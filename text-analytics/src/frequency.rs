use std::collections::HashMap;
use threadscope_core::Post;

use crate::normalizer::Normalizer;

/// Counter that remembers first-insertion order, so ranking ties resolve to
/// whichever key was seen first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `n` highest counts, descending, ties in first-seen order.
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

impl<S: AsRef<str>> FromIterator<S> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = Self::new();
        for key in iter {
            table.add(key.as_ref());
        }
        table
    }
}

/// Most frequent content words over every post's title and body.
pub fn common_words(posts: &[Post], normalizer: &Normalizer, top_n: usize) -> Vec<(String, usize)> {
    let all_text = posts
        .iter()
        .map(Post::headline_text)
        .collect::<Vec<_>>()
        .join(" ");

    normalizer
        .content_words(&all_text)
        .into_iter()
        .collect::<FrequencyTable>()
        .most_common(top_n)
}

/// Most frequent two- and three-word phrases.
///
/// Bigrams and trigrams are ranked separately, `top_n / 2` of each is kept,
/// and only then is the merged list re-sorted and cut to `top_n`. A frequent
/// trigram can therefore lose its place to a rarer bigram.
pub fn common_phrases(
    posts: &[Post],
    normalizer: &Normalizer,
    top_n: usize,
) -> Vec<(String, usize)> {
    let mut bigrams = FrequencyTable::new();
    let mut trigrams = FrequencyTable::new();

    for post in posts {
        for sentence in normalizer.tokenize_sentences(&post.headline_text()) {
            let words = normalizer.content_words(&sentence);
            for pair in words.windows(2) {
                bigrams.add(&pair.join(" "));
            }
            for triple in words.windows(3) {
                trigrams.add(&triple.join(" "));
            }
        }
    }

    let mut phrases = bigrams.most_common(top_n / 2);
    phrases.extend(trigrams.most_common(top_n / 2));
    phrases.sort_by(|a, b| b.1.cmp(&a.1));
    phrases.truncate(top_n);
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_common_is_stable() {
        let table: FrequencyTable = ["beta", "alpha", "beta", "gamma", "alpha", "delta"]
            .into_iter()
            .collect();
        assert_eq!(
            table.most_common(3),
            vec![
                ("beta".to_string(), 2),
                ("alpha".to_string(), 2),
                ("gamma".to_string(), 1)
            ]
        );
        assert_eq!(table.get("delta"), 1);
        assert_eq!(table.get("missing"), 0);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_most_common_beyond_len() {
        let table: FrequencyTable = ["only"].into_iter().collect();
        assert_eq!(table.most_common(10).len(), 1);
        assert!(FrequencyTable::new().most_common(5).is_empty());
    }
}
