use chrono::{TimeZone, Utc};
use text_analytics::{
    common_phrases, common_words, Analyzer, LexiconCountStrategy, Normalizer, ProcessedResults,
    ReportKind, RuleTokenizer, SentimentStrategy, Stopwords, Tokenizer, NO_RESULTS_MESSAGE,
    NOTHING_TO_ANALYZE,
};
use threadscope_core::{AnalysisError, Comment, Post, SentimentCategory, Source};

fn post(title: &str, content: &str) -> Post {
    Post {
        title: title.to_string(),
        url: "https://www.reddit.com/r/test/comments/1/post/".to_string(),
        source: Source::Reddit,
        community: "r/test".to_string(),
        date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        content: content.to_string(),
        comments: Vec::new(),
    }
}

fn comment(body: &str, replies: Vec<Comment>) -> Comment {
    Comment {
        author: "u/tester".to_string(),
        score: 1,
        body: body.to_string(),
        replies,
    }
}

struct FailingTokenizer;

impl Tokenizer for FailingTokenizer {
    fn words(&self, text: &str) -> Result<Vec<String>, AnalysisError> {
        Err(AnalysisError::TokenizationFailed {
            text_length: text.len(),
        })
    }

    fn sentences(&self, text: &str) -> Result<Vec<String>, AnalysisError> {
        Err(AnalysisError::TokenizationFailed {
            text_length: text.len(),
        })
    }
}

#[test]
fn test_word_ranking_ignores_case() {
    let normalizer = Normalizer::default();
    let mixed = vec![post("Great product", ""), post("great PRODUCT", "")];
    let lower = vec![post("great product", ""), post("great product", "")];

    let ranking = common_words(&mixed, &normalizer, 20);
    assert_eq!(ranking, common_words(&lower, &normalizer, 20));
    assert_eq!(
        ranking,
        vec![("great".to_string(), 2), ("product".to_string(), 2)]
    );
}

#[test]
fn test_analysis_is_idempotent() {
    let analyzer = Analyzer::default();
    let posts: Vec<Post> = (0..6)
        .map(|i| {
            post(
                &format!("Thread {} about async runtimes", i),
                "Tokio scales well. Async code is tricky. Runtimes differ in scheduling. \
                 Benchmarks help a lot.",
            )
        })
        .collect();

    let first = analyzer.analyze_results(&posts);
    let second = analyzer.analyze_results(&posts);
    assert_eq!(first.common_words, second.common_words);
    assert_eq!(first.common_phrases, second.common_phrases);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first, second);
}

#[test]
fn test_summary_short_circuit_keeps_order() {
    let analyzer = Analyzer::default();
    let posts = vec![
        post("One", "Zebras are rare. Apples are common."),
        post("Two", "Nothing else matters!"),
    ];

    let result = analyzer.analyze_results(&posts);
    assert_eq!(
        result.summary,
        "Zebras are rare. Apples are common. Nothing else matters!"
    );
}

#[test]
fn test_long_input_summary_is_bounded() {
    let analyzer = Analyzer::default();
    let content: String = (0..15)
        .map(|i| format!("Sentence number {} mentions rust. ", i))
        .collect();
    let result = analyzer.analyze_results(&[post("Long", &content)]);

    let sentences = analyzer.normalizer().tokenize_sentences(&result.summary);
    assert_eq!(sentences.len(), 10);
}

#[test]
fn test_lexicon_count_classification() {
    let strategy = LexiconCountStrategy::default();
    assert_eq!(
        strategy.score(&post("", "This is great and awesome")).category,
        SentimentCategory::Positive
    );
    assert_eq!(
        strategy.score(&post("good", "but bad")).category,
        SentimentCategory::Neutral
    );
    assert_eq!(
        strategy.score(&post("Avoid", "slow and broken")).category,
        SentimentCategory::Negative
    );
    assert!(strategy.score(&post("", "")).scores.is_none());
}

#[test]
fn test_quick_and_full_sentiment_differ_by_source_text() {
    let analyzer = Analyzer::default();
    let mut thread = post("Question", "What do you think?");
    thread.comments = vec![comment(
        "It is wonderful",
        vec![comment("Truly wonderful and amazing", vec![])],
    )];

    let quick = analyzer.analyze(&[thread.clone()], ReportKind::Quick);
    assert_eq!(quick.sentiment.neutral, 1);

    let full = analyzer.analyze(&[thread], ReportKind::Full);
    assert_eq!(full.sentiment.positive, 1);
}

#[test]
fn test_empty_quick_analysis() {
    let result = Analyzer::default().analyze_results(&[]);
    assert_eq!(result.total_results, 0);
    assert_eq!(result.sentiment.total(), 0);
    assert!(result.common_words.is_empty());
    assert_eq!(result.summary, NOTHING_TO_ANALYZE);
}

#[test]
fn test_tokenizer_failure_falls_back() {
    let normalizer = Normalizer::with_tokenizer(FailingTokenizer, Stopwords::english());
    assert_eq!(
        normalizer.tokenize_words("Hello World  again!"),
        vec!["hello", "world", "again!"]
    );
    assert_eq!(
        normalizer.tokenize_sentences("First part. Second part."),
        vec!["First part", "Second part"]
    );
    assert_eq!(
        normalizer.content_words("Great tools, great results!"),
        vec!["great", "tools", "great", "results"]
    );

    let posts = vec![post("Great tools", "Great results. Great people.")];
    let words = common_words(&posts, &normalizer, 1);
    assert_eq!(words, vec![("great".to_string(), 3)]);
}

#[test]
fn test_oversized_input_falls_back() {
    let normalizer = Normalizer::with_tokenizer(RuleTokenizer::new(10), Stopwords::english());
    assert_eq!(
        normalizer.tokenize_words("well beyond the limit"),
        vec!["well", "beyond", "the", "limit"]
    );
}

#[test]
fn test_phrases_are_selected_per_kind() {
    let normalizer = Normalizer::default();
    let posts = vec![post(
        "Alpha beta gamma.",
        "Alpha beta gamma. Alpha beta gamma. Delta epsilon zeta. Delta epsilon zeta.",
    )];

    // One bigram and one trigram survive, even though the second bigram
    // ties the trigram's count.
    let phrases = common_phrases(&posts, &normalizer, 2);
    assert_eq!(
        phrases,
        vec![
            ("alpha beta".to_string(), 3),
            ("alpha beta gamma".to_string(), 3)
        ]
    );

    let phrases = common_phrases(&posts, &normalizer, 4);
    assert_eq!(phrases.len(), 4);
    assert!(phrases.contains(&("delta epsilon zeta".to_string(), 2)));
    assert!(!phrases.contains(&("delta epsilon".to_string(), 2)));
}

#[test]
fn test_phrases_do_not_cross_sentences() {
    let normalizer = Normalizer::default();
    let posts = vec![post("Rust", "Memory safety. Fearless concurrency.")];
    let phrases = common_phrases(&posts, &normalizer, 10);
    assert!(phrases.iter().all(|(phrase, _)| phrase != "safety fearless"));
    assert!(phrases.contains(&("memory safety".to_string(), 1)));
}

#[test]
fn test_processed_results_package() {
    let analyzer = Analyzer::default();
    let mut first = post("Praise", "I love this great tool");
    first.comments = vec![comment("Awesome work", vec![])];
    let second = post("Complaint", "This is terrible and awful");

    let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();
    let processed = analyzer.process_results_at(&[first, second], "tools", now);

    let ProcessedResults::Complete {
        processed_data,
        analysis,
    } = &processed
    else {
        panic!("expected a complete package");
    };

    assert_eq!(processed_data.len(), 2);
    assert_eq!(processed_data[0].id, 1);
    assert_eq!(processed_data[1].id, 2);
    assert_eq!(processed_data[1].search_term, "tools");
    assert_eq!(processed_data[0].created_at, now);

    let summary = &analysis.sentiment.summary;
    assert_eq!(summary.total, 2);
    assert_eq!(summary.positive, 1);
    assert_eq!(summary.negative, 1);
    assert_eq!(analysis.sentiment.details[0].category, SentimentCategory::Positive);
    let mean = (analysis.sentiment.details[0].compound + analysis.sentiment.details[1].compound) / 2.0;
    assert!((summary.average_compound - mean).abs() < 1e-12);

    let lines: Vec<&str> = analysis.summary.lines().collect();
    assert_eq!(lines[0], "Analysis of 2 results for the search term.");
    assert_eq!(lines[1], "Sources: 2 from Reddit.");
    assert_eq!(
        lines[2],
        "Sentiment analysis: 1 positive, 1 negative, and 0 neutral results."
    );
    assert_eq!(lines[3], "Most common words: love, great, tool, awesome, work.");
    assert!(lines[4].starts_with("Common phrases: love great, great tool"));
    assert_eq!(processed.narrative(), analysis.summary);

    let json = serde_json::to_value(&processed).unwrap();
    assert_eq!(json["processed_data"][0]["title"], "Praise");
    assert_eq!(json["processed_data"][0]["id"], 1);
    assert_eq!(json["analysis"]["word_frequency"]["common_words"][0][0], "love");
}

#[test]
fn test_processed_results_empty() {
    let processed = Analyzer::default().process_results(&[], "nothing");
    assert_eq!(processed.total_results(), 0);
    assert_eq!(processed.narrative(), NO_RESULTS_MESSAGE);

    let json = serde_json::to_value(&processed).unwrap();
    assert_eq!(json["total_results"], 0);
    assert_eq!(json["message"], NO_RESULTS_MESSAGE);
}
