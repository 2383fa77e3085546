use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::{self, Write};
use std::str::FromStr;
use threadscope_core::{AnalysisResult, CoreError, Post, Source};
use tracing::error;

use crate::sentiment::{LexiconCountStrategy, SentimentStrategy, ValenceStrategy};

/// Which report a caller wants; each kind fixes its sentiment strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportKind {
    /// Word-count sentiment over titles and bodies.
    #[default]
    Quick,
    /// Valence sentiment over bodies and whole comment trees.
    Full,
}

impl ReportKind {
    pub fn strategy(&self) -> Box<dyn SentimentStrategy> {
        match self {
            ReportKind::Quick => Box::new(LexiconCountStrategy::default()),
            ReportKind::Full => Box::new(ValenceStrategy::default()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Quick => "quick",
            ReportKind::Full => "full",
        }
    }
}

impl FromStr for ReportKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quick" => Ok(ReportKind::Quick),
            "full" => Ok(ReportKind::Full),
            other => Err(CoreError::InvalidInput {
                message: format!("report kind must be quick or full, got '{}'", other),
            }),
        }
    }
}

/// How many ranked entries the text report lists.
#[derive(Debug, Clone, Copy)]
pub struct ReportLimits {
    pub words: usize,
    pub phrases: usize,
}

impl Default for ReportLimits {
    fn default() -> Self {
        Self {
            words: 10,
            phrases: 5,
        }
    }
}

/// Renders the quick analysis as plain text. Empty sections are left out;
/// a rendering failure ends the report with an error line after whatever
/// was already written.
pub fn generate_text_report(
    analysis: &AnalysisResult,
    search_term: &str,
    limits: ReportLimits,
) -> String {
    let mut report = String::new();
    let result = write_report(&mut report, analysis, search_term, limits);
    finish_report(report, result)
}

fn finish_report(mut report: String, result: fmt::Result) -> String {
    if let Err(e) = result {
        error!("Error generating report: {}", e);
        if !report.is_empty() && !report.ends_with('\n') {
            report.push('\n');
        }
        report.push_str(&format!("Error generating report: {}", e));
    }
    report
}

fn write_report<W: Write>(
    out: &mut W,
    analysis: &AnalysisResult,
    search_term: &str,
    limits: ReportLimits,
) -> fmt::Result {
    write!(out, "=== Analysis Report for '{}' ===\n\n", search_term)?;
    writeln!(out, "Total results: {}", analysis.total_results)?;

    if !analysis.source_counts.is_empty() {
        let sources = analysis
            .source_counts
            .iter()
            .map(|(source, count)| format!("{} ({})", source, count))
            .collect::<Vec<_>>()
            .join(", ");
        write!(out, "Sources: {}\n\n", sources)?;
    }

    let sentiment = &analysis.sentiment;
    let total = sentiment.total();
    if total > 0 {
        writeln!(out, "Sentiment Analysis:")?;
        for (label, count) in [
            ("Positive", sentiment.positive),
            ("Neutral", sentiment.neutral),
            ("Negative", sentiment.negative),
        ] {
            let percent = count as f64 / total as f64 * 100.0;
            writeln!(out, "  {}: {} ({:.1}%)", label, count, percent)?;
        }
        writeln!(out)?;
    }

    write_ranked(out, "Common Words", &analysis.common_words, limits.words)?;
    write_ranked(out, "Common Phrases", &analysis.common_phrases, limits.phrases)?;

    if !analysis.summary.is_empty() {
        writeln!(out, "Summary:")?;
        out.write_str(&analysis.summary)?;
    }
    Ok(())
}

fn write_ranked<W: Write>(
    out: &mut W,
    heading: &str,
    entries: &[(String, usize)],
    limit: usize,
) -> fmt::Result {
    if entries.is_empty() {
        return Ok(());
    }
    writeln!(out, "{}:", heading)?;
    for (entry, count) in entries.iter().take(limit) {
        writeln!(out, "  {}: {}", entry, count)?;
    }
    writeln!(out)
}

/// One row of a result listing, borrowing the post it summarises.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayRow<'a> {
    pub title: &'a str,
    pub source: Source,
    pub community: &'a str,
    pub date: DateTime<Utc>,
    pub url: &'a str,
    pub content: String,
    #[serde(skip)]
    pub full_result: &'a Post,
}

/// Rows for listing, with bodies longer than `max_chars` characters cut to
/// `max_chars - 3` characters plus `...`.
pub fn format_results_for_display(posts: &[Post], max_chars: usize) -> Vec<DisplayRow<'_>> {
    posts
        .iter()
        .map(|post| DisplayRow {
            title: &post.title,
            source: post.source,
            community: &post.community,
            date: post.date,
            url: &post.url,
            content: truncate_content(&post.content, max_chars),
            full_result: post,
        })
        .collect()
}

fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let kept: String = content.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
