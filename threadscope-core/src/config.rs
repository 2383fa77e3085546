use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

use crate::error::{ConfigError, CoreError};

pub const CONFIG_PATH_ENV: &str = "THREADSCOPE_CONFIG";
pub const DATABASE_URL_ENV: &str = "THREADSCOPE_DATABASE_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reddit: RedditConfig,
    pub analysis: AnalysisConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Listing size per search page; the API caps this at 100.
    pub page_size: u32,
    pub max_pages: usize,
    pub max_posts: usize,
    pub comment_limit: u32,
    pub request_timeout_secs: u64,
    pub comment_concurrency: usize,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.reddit.com".to_string(),
            user_agent: concat!("threadscope/", env!("CARGO_PKG_VERSION")).to_string(),
            page_size: 100,
            max_pages: 2,
            max_posts: 25,
            comment_limit: 500,
            request_timeout_secs: 30,
            comment_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub top_words: usize,
    pub top_phrases: usize,
    pub summary_sentences: usize,
    pub report_words: usize,
    pub report_phrases: usize,
    pub display_content_chars: usize,
    pub max_tokenizer_input: usize,
    pub stopwords: Option<Vec<String>>,
    pub stopwords_file: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_words: 20,
            top_phrases: 10,
            summary_sentences: 10,
            report_words: 10,
            report_phrases: 5,
            display_content_chars: 300,
            max_tokenizer_input: 1_000_000,
            stopwords: None,
            stopwords_file: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_url: String,
    pub results_dir: PathBuf,
    pub history_limit: u32,
    pub results_limit: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://threadscope.db".to_string(),
            results_dir: PathBuf::from("results"),
            history_limit: 10,
            results_limit: 50,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let config: AppConfig = toml::from_str(raw).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| -> CoreError {
            match e.kind() {
                std::io::ErrorKind::NotFound => ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into(),
                std::io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied {
                    path: path.display().to_string(),
                }
                .into(),
                _ => CoreError::Io(e),
            }
        })?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&raw)
    }

    /// Explicit path first, then `THREADSCOPE_CONFIG`, then built-in defaults.
    /// `THREADSCOPE_DATABASE_URL` overrides the storage URL in every case.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let env_path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => {
                info!("No configuration file given, using defaults");
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.storage.database_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let reddit = &self.reddit;
        if reddit.page_size == 0 || reddit.page_size > 100 {
            return Err(invalid("reddit.page_size", reddit.page_size));
        }
        if reddit.max_pages == 0 {
            return Err(invalid("reddit.max_pages", reddit.max_pages));
        }
        if reddit.comment_concurrency == 0 {
            return Err(invalid(
                "reddit.comment_concurrency",
                reddit.comment_concurrency,
            ));
        }
        if !is_web_url(&reddit.base_url) {
            return Err(invalid("reddit.base_url", &reddit.base_url));
        }
        if self.analysis.max_tokenizer_input == 0 {
            return Err(invalid(
                "analysis.max_tokenizer_input",
                self.analysis.max_tokenizer_input,
            ));
        }
        if self.storage.database_url.trim().is_empty() {
            return Err(invalid("storage.database_url", "<empty>"));
        }
        Ok(())
    }
}

/// An absolute http(s) URL with a host.
fn is_web_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reddit.page_size, 100);
        assert_eq!(config.reddit.max_pages, 2);
        assert_eq!(config.reddit.max_posts, 25);
        assert_eq!(config.analysis.summary_sentences, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [reddit]
            max_posts = 10

            [analysis]
            stopwords = ["foo", "bar"]
            "#,
        )
        .unwrap();

        assert_eq!(config.reddit.max_posts, 10);
        assert_eq!(config.reddit.page_size, 100);
        assert_eq!(
            config.analysis.stopwords,
            Some(vec!["foo".to_string(), "bar".to_string()])
        );
        assert_eq!(config.storage.history_limit, 10);
    }

    #[test]
    fn test_rejects_oversized_page() {
        let result = AppConfig::from_toml_str("[reddit]\npage_size = 500\n");
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::InvalidValue { ref field, .. })) if field == "reddit.page_size"
        ));
    }

    #[test]
    fn test_rejects_unusable_base_urls() {
        for base_url in [
            "https://",
            "http://exa mple .com",
            "https://[::1",
            "ftp://www.reddit.com",
            "www.reddit.com",
        ] {
            let mut config = AppConfig::default();
            config.reddit.base_url = base_url.to_string();
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::InvalidValue { ref field, .. }) if field == "reddit.base_url"
                ),
                "accepted {}",
                base_url
            );
        }

        let mut config = AppConfig::default();
        config.reddit.base_url = "http://localhost:8080".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = AppConfig::from_toml_str("[reddit\n");
        assert!(matches!(result, Err(CoreError::Config(ConfigError::Parse(_)))));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(
            result,
            Err(CoreError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
