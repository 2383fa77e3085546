use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use threadscope_core::{CoreError, RedditApiError, RedditConfig};
use tracing::{debug, error, warn};
use url::Url;

/// Public, unauthenticated JSON API host; post links are built against it.
pub const REDDIT_WEB_BASE: &str = "https://www.reddit.com";

/// Listing envelope: "thing wraps data wraps children". Children stay raw so
/// that one malformed item cannot poison the rest of the page.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: RedditListingData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedditListingData {
    pub children: Vec<Value>,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild<T> {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: T,
}

/// The subset of a search result item the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedditPostData {
    pub title: Option<String>,
    pub permalink: Option<String>,
    pub subreddit_name_prefixed: Option<String>,
    pub created_utc: Option<f64>,
    pub selftext: Option<String>,
    pub url: Option<String>,
}

/// The subset of a comment node the flattener reads. `replies` is read
/// straight off the raw node since it is either a listing or `""`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedditCommentData {
    pub body: Option<String>,
    pub author: Option<String>,
    pub score: Option<i64>,
}

/// Read side of the remote API. Implementations return the decoded JSON body
/// of a successful response and an error for anything else.
#[async_trait]
pub trait RedditTransport: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, CoreError>;
}

#[derive(Debug)]
pub struct HttpTransport {
    http_client: Client,
    base_url: Url,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(config: &RedditConfig) -> Result<Self, CoreError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| CoreError::InvalidInput {
            message: format!("invalid Reddit base URL '{}': {}", config.base_url, e),
        })?;

        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, CoreError> {
        self.base_url
            .join(path)
            .map_err(|e| CoreError::InvalidInput {
                message: format!("invalid Reddit path '{}': {}", path, e),
            })
    }
}

#[async_trait]
impl RedditTransport for HttpTransport {
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, CoreError> {
        let url = self.endpoint_url(path)?;
        debug!("GET {}", url);

        let response = match self.http_client.get(url).query(query).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for GET {}: {}", path, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Request failed with status: {} for {}", status, path);
            return Err(status_error(status, path, response.headers()).into());
        }

        response.json::<Value>().await.map_err(|e| {
            error!("Failed to decode JSON from {}: {}", path, e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Malformed JSON from {}", path),
            })
        })
    }
}

fn status_error(
    status: StatusCode,
    endpoint: &str,
    headers: &reqwest::header::HeaderMap,
) -> RedditApiError {
    match status.as_u16() {
        429 => {
            let retry_after = headers
                .get("retry-after")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(60);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        403 => RedditApiError::Forbidden {
            resource: endpoint.to_string(),
        },
        404 => RedditApiError::NotFound {
            resource: endpoint.to_string(),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            status_code: code,
        },
    }
}

/// Decode a listing payload. Anything that is not a listing is an
/// `InvalidResponse`.
pub fn parse_listing(payload: Value, what: &str) -> Result<RedditListing, CoreError> {
    serde_json::from_value(payload).map_err(|e| {
        error!("Failed to parse {}: {}", what, e);
        CoreError::RedditApi(RedditApiError::InvalidResponse {
            details: format!("Failed to parse {}", what),
        })
    })
}
