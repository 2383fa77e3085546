use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use threadscope_core::{CoreError, ExportError, Post};
use tracing::info;

const CSV_HEADER: [&str; 7] = [
    "title",
    "url",
    "source",
    "community",
    "date",
    "content",
    "comments",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(ExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// `<results_dir>/YYYY-MM-DD/<keyword>_<HH>.<ext>`, with `all_results`
/// standing in for a missing keyword.
pub fn organized_export_path(
    results_dir: &Path,
    keyword: Option<&str>,
    now: DateTime<Utc>,
    format: ExportFormat,
) -> PathBuf {
    let stem = match keyword.map(str::trim).filter(|k| !k.is_empty()) {
        Some(keyword) => file_safe(keyword),
        None => "all_results".to_string(),
    };
    results_dir
        .join(now.format("%Y-%m-%d").to_string())
        .join(format!("{}_{}.{}", stem, now.format("%H"), format.extension()))
}

fn file_safe(keyword: &str) -> String {
    keyword
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Writes `posts` to `<dir>/<stem>.<ext>`, creating `dir` if needed.
pub fn export_posts(
    posts: &[Post],
    format: ExportFormat,
    dir: &Path,
    stem: &str,
) -> Result<PathBuf, CoreError> {
    let path = dir.join(format!("{}.{}", stem, format.extension()));
    write_posts(posts, format, &path)?;
    Ok(path)
}

/// Writes `posts` to exactly `path`, creating parent directories.
pub fn write_posts(posts: &[Post], format: ExportFormat, path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let body = match format {
        ExportFormat::Json => serde_json::to_string_pretty(posts)?,
        ExportFormat::Csv => to_csv(posts)?,
    };
    fs::write(path, body)?;

    info!("Exported {} posts to {}", posts.len(), path.display());
    Ok(())
}

pub fn read_json_export(path: &Path) -> Result<Vec<Post>, CoreError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn to_csv(posts: &[Post]) -> Result<String, CoreError> {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER.iter().copied());

    for post in posts {
        let date = post.date.to_rfc3339_opts(SecondsFormat::Secs, true);
        let comments = if post.comments.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&post.comments)?
        };
        push_record(
            &mut out,
            [
                post.title.as_str(),
                post.url.as_str(),
                post.source.as_str(),
                post.community.as_str(),
                date.as_str(),
                post.content.as_str(),
                comments.as_str(),
            ],
        );
    }
    Ok(out)
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
