pub mod export;


pub use export::{export_posts, organized_export_path, read_json_export, write_posts, ExportFormat};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use threadscope_core::{Comment, CoreError, DatabaseError, ExportError, Post, Source, Timeframe};
use tracing::{debug, info, warn};

/// Upper bound on rows written by one export.
pub const EXPORT_LIMIT: u32 = 1000;

const SCHEMA: &[(&str, &str)] = &[
    (
        "create_results",
        "CREATE TABLE IF NOT EXISTS results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            source TEXT NOT NULL,
            community TEXT,
            date TEXT,
            content TEXT,
            search_term TEXT NOT NULL,
            created_at TEXT NOT NULL,
            comments TEXT
        )",
    ),
    (
        "create_searches",
        "CREATE TABLE IF NOT EXISTS searches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            search_term TEXT NOT NULL,
            timeframe TEXT NOT NULL,
            timestamp TEXT NOT NULL
        )",
    ),
    (
        "index_results_search_term",
        "CREATE INDEX IF NOT EXISTS idx_results_search_term ON results (search_term)",
    ),
    (
        "index_searches_timestamp",
        "CREATE INDEX IF NOT EXISTS idx_searches_timestamp ON searches (timestamp)",
    ),
];

/// Fixed-width UTC timestamps so that text comparison orders them.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|e| DatabaseError::MalformedRow {
            details: format!("timestamp '{}': {}", raw, e),
        })
}

/// Filters for [`Database::get_results`]. Unset fields do not filter.
#[derive(Debug, Clone)]
pub struct ResultFilter {
    pub search_term: Option<String>,
    pub source: Option<Source>,
    pub timeframe: Option<Timeframe>,
    pub limit: u32,
    /// Reference point for the timeframe cutoff; the current time if unset.
    pub now: Option<DateTime<Utc>>,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            search_term: None,
            source: None,
            timeframe: None,
            limit: 50,
            now: None,
        }
    }
}

impl ResultFilter {
    pub fn for_term(search_term: impl Into<String>) -> Self {
        Self {
            search_term: Some(search_term.into()),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// `All` means no cutoff at all.
    fn cutoff(&self) -> Option<DateTime<Utc>> {
        match self.timeframe {
            None | Some(Timeframe::All) => None,
            Some(timeframe) => Some(timeframe.cutoff(self.now.unwrap_or_else(Utc::now))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRecord {
    pub id: i64,
    pub search_term: String,
    pub timeframe: String,
    pub timestamp: DateTime<Utc>,
}

/// SQLite store for fetched posts and search history. Inserts only, apart
/// from the explicit [`clear_results`](Database::clear_results).
pub struct Database {
    connection_string: String,
    pool: Option<SqlitePool>,
}

impl Database {
    pub fn new(connection_string: String) -> Self {
        Self {
            connection_string,
            pool: None,
        }
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    fn pool(&self) -> Result<&SqlitePool, DatabaseError> {
        self.pool.as_ref().ok_or(DatabaseError::NotConnected)
    }

    pub async fn connect(&mut self) -> Result<(), CoreError> {
        let options = SqliteConnectOptions::from_str(&self.connection_string)
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!("Connected to database {}", self.connection_string);
        self.pool = Some(pool);
        Ok(())
    }

    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        let pool = self.pool()?;
        for (name, statement) in SCHEMA {
            sqlx::query(statement)
                .execute(pool)
                .await
                .map_err(|e| DatabaseError::MigrationFailed {
                    migration: format!("{}: {}", name, e),
                })?;
        }
        debug!("Applied {} schema statements", SCHEMA.len());
        Ok(())
    }

    /// Stores every post under `search_term`. Returns the number of rows written.
    pub async fn save_results(&self, posts: &[Post], search_term: &str) -> Result<usize, CoreError> {
        let pool = self.pool()?;
        let created_at = format_timestamp(Utc::now());
        let mut tx = pool.begin().await.map_err(DatabaseError::from)?;

        for post in posts {
            let comments = if post.comments.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&post.comments)?)
            };

            sqlx::query(
                "INSERT INTO results
                 (title, url, source, community, date, content, search_term, created_at, comments)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&post.title)
            .bind(&post.url)
            .bind(post.source.as_str())
            .bind(&post.community)
            .bind(format_timestamp(post.date))
            .bind(&post.content)
            .bind(search_term)
            .bind(&created_at)
            .bind(comments)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        info!("Saved {} results for '{}'", posts.len(), search_term);
        Ok(posts.len())
    }

    pub async fn save_search(&self, search_term: &str, timeframe: Timeframe) -> Result<(), CoreError> {
        let pool = self.pool()?;
        sqlx::query("INSERT INTO searches (search_term, timeframe, timestamp) VALUES (?, ?, ?)")
            .bind(search_term)
            .bind(timeframe.as_str())
            .bind(format_timestamp(Utc::now()))
            .execute(pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Newest posts first.
    pub async fn get_results(&self, filter: &ResultFilter) -> Result<Vec<Post>, CoreError> {
        let pool = self.pool()?;

        let mut conditions = Vec::new();
        if filter.search_term.is_some() {
            conditions.push("search_term = ?");
        }
        if filter.source.is_some() {
            conditions.push("source = ?");
        }
        let cutoff = filter.cutoff();
        if cutoff.is_some() {
            conditions.push("date >= ?");
        }

        let mut sql = String::from(
            "SELECT title, url, source, community, date, content, comments FROM results",
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY date DESC, id ASC LIMIT ?");

        let mut query = sqlx::query(&sql);
        if let Some(term) = &filter.search_term {
            query = query.bind(term);
        }
        if let Some(source) = filter.source {
            query = query.bind(source.as_str());
        }
        if let Some(cutoff) = cutoff {
            query = query.bind(format_timestamp(cutoff));
        }
        query = query.bind(filter.limit);

        let rows = query.fetch_all(pool).await.map_err(DatabaseError::from)?;
        let posts = rows
            .iter()
            .map(post_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Loaded {} stored results", posts.len());
        Ok(posts)
    }

    /// Newest searches first.
    pub async fn get_search_history(&self, limit: u32) -> Result<Vec<SearchRecord>, CoreError> {
        let pool = self.pool()?;
        let rows = sqlx::query(
            "SELECT id, search_term, timeframe, timestamp FROM searches
             ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::from)?;

        let history = rows
            .iter()
            .map(|row| -> Result<SearchRecord, DatabaseError> {
                let timestamp: String = row.try_get("timestamp")?;
                Ok(SearchRecord {
                    id: row.try_get("id")?,
                    search_term: row.try_get("search_term")?,
                    timeframe: row.try_get("timeframe")?,
                    timestamp: parse_timestamp(&timestamp)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(history)
    }

    /// Deletes stored results, for one search term or all of them. Returns
    /// the number of rows removed.
    pub async fn clear_results(&self, search_term: Option<&str>) -> Result<u64, CoreError> {
        let pool = self.pool()?;
        let result = match search_term {
            Some(term) => {
                sqlx::query("DELETE FROM results WHERE search_term = ?")
                    .bind(term)
                    .execute(pool)
                    .await
            }
            None => sqlx::query("DELETE FROM results").execute(pool).await,
        }
        .map_err(DatabaseError::from)?;

        info!("Cleared {} stored results", result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Writes stored results, for one search term or all of them, to `path`.
    /// Returns the number of posts written; an empty selection is an error
    /// and leaves no file behind.
    pub async fn export_results(
        &self,
        search_term: Option<&str>,
        format: ExportFormat,
        path: &Path,
    ) -> Result<usize, CoreError> {
        let filter = ResultFilter {
            search_term: search_term.map(str::to_string),
            limit: EXPORT_LIMIT,
            ..ResultFilter::default()
        };
        let posts = self.get_results(&filter).await?;
        if posts.is_empty() {
            return Err(ExportError::NoResults {
                search_term: search_term.unwrap_or("all results").to_string(),
            }
            .into());
        }

        write_posts(&posts, format, path)?;
        Ok(posts.len())
    }

    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
        }
    }
}

fn post_from_row(row: &SqliteRow) -> Result<Post, DatabaseError> {
    let source: String = row.try_get("source")?;
    let date: Option<String> = row.try_get("date")?;
    let comments: Option<String> = row.try_get("comments")?;

    let date = date.ok_or_else(|| DatabaseError::MalformedRow {
        details: "result row has no date".to_string(),
    })?;

    Ok(Post {
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        source: Source::from_str(&source).map_err(|e| DatabaseError::MalformedRow {
            details: e.to_string(),
        })?,
        community: row.try_get::<Option<String>, _>("community")?.unwrap_or_default(),
        date: parse_timestamp(&date)?,
        content: row.try_get::<Option<String>, _>("content")?.unwrap_or_default(),
        comments: decode_comments(comments.as_deref()),
    })
}

/// Missing, empty or unreadable comment JSON all mean "no comments".
fn decode_comments(raw: Option<&str>) -> Vec<Comment> {
    match raw.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!("Discarding unreadable stored comments: {}", e);
            Vec::new()
        }),
    }
}
