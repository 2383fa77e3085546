pub mod api;
pub mod comments;
pub mod metrics;
pub mod search;


pub use api::{HttpTransport, RedditTransport, REDDIT_WEB_BASE};
pub use comments::{comments_from_thread, flatten_listing};
pub use metrics::{EndpointKind, FetchMetrics, MetricsCollector};
pub use search::{RedditSearcher, SearchSettings};
