use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Which remote call a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    SearchPage,
    Comments,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub average_response_time: Duration,
    pub last_request_time: Option<SystemTime>,
    pub requests_by_endpoint: HashMap<EndpointKind, EndpointMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointMetrics {
    pub request_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub total_response_time: Duration,
    pub min_response_time: Duration,
    pub max_response_time: Duration,
    pub last_error_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestMetrics {
    pub endpoint: EndpointKind,
    pub response_time: Duration,
    pub success: bool,
    pub error_code: Option<String>,
}

impl Default for FetchMetrics {
    fn default() -> Self {
        Self {
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            average_response_time: Duration::from_millis(0),
            last_request_time: None,
            requests_by_endpoint: HashMap::new(),
        }
    }
}

impl FetchMetrics {
    pub fn requests_to(&self, endpoint: EndpointKind) -> u64 {
        self.requests_by_endpoint
            .get(&endpoint)
            .map(|metrics| metrics.request_count)
            .unwrap_or(0)
    }
}

impl EndpointMetrics {
    fn new() -> Self {
        Self {
            request_count: 0,
            success_count: 0,
            error_count: 0,
            total_response_time: Duration::from_millis(0),
            min_response_time: Duration::MAX,
            max_response_time: Duration::from_millis(0),
            last_error_code: None,
        }
    }

    fn update(&mut self, metrics: &RequestMetrics) {
        self.request_count += 1;
        self.total_response_time += metrics.response_time;
        self.min_response_time = self.min_response_time.min(metrics.response_time);
        self.max_response_time = self.max_response_time.max(metrics.response_time);

        if metrics.success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
            self.last_error_code = metrics.error_code.clone();
        }
    }

    pub fn average_response_time(&self) -> Duration {
        if self.request_count == 0 {
            Duration::from_millis(0)
        } else {
            self.total_response_time / self.request_count as u32
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.request_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.request_count as f64
        }
    }
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<FetchMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_request(&self, request_metrics: RequestMetrics) {
        let mut metrics = self.metrics.write().await;

        let previous_total = metrics.total_requests;
        metrics.total_requests += 1;
        if request_metrics.success {
            metrics.successful_requests += 1;
        } else {
            metrics.failed_requests += 1;
        }

        // Running mean over every request seen so far.
        let total_time =
            metrics.average_response_time * previous_total as u32 + request_metrics.response_time;
        metrics.average_response_time = total_time / metrics.total_requests as u32;
        metrics.last_request_time = Some(SystemTime::now());

        metrics
            .requests_by_endpoint
            .entry(request_metrics.endpoint)
            .or_insert_with(EndpointMetrics::new)
            .update(&request_metrics);
    }

    pub async fn get_metrics(&self) -> FetchMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn get_endpoint_metrics(&self, endpoint: EndpointKind) -> Option<EndpointMetrics> {
        self.metrics
            .read()
            .await
            .requests_by_endpoint
            .get(&endpoint)
            .cloned()
    }

    pub async fn reset_metrics(&self) {
        *self.metrics.write().await = FetchMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(endpoint: EndpointKind, millis: u64, success: bool) -> RequestMetrics {
        RequestMetrics {
            endpoint,
            response_time: Duration::from_millis(millis),
            success,
            error_code: (!success).then(|| "REDDIT_API".to_string()),
        }
    }

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new();
        collector
            .record_request(request(EndpointKind::SearchPage, 100, true))
            .await;
        collector
            .record_request(request(EndpointKind::SearchPage, 300, false))
            .await;
        collector
            .record_request(request(EndpointKind::Comments, 200, true))
            .await;

        let metrics = collector.get_metrics().await;
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.successful_requests, 2);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.average_response_time, Duration::from_millis(200));
        assert!(metrics.last_request_time.is_some());
        assert_eq!(metrics.requests_to(EndpointKind::SearchPage), 2);
        assert_eq!(metrics.requests_to(EndpointKind::Comments), 1);
    }

    #[tokio::test]
    async fn test_endpoint_specific_metrics() {
        let collector = MetricsCollector::new();
        collector
            .record_request(request(EndpointKind::Comments, 150, true))
            .await;
        collector
            .record_request(request(EndpointKind::Comments, 250, false))
            .await;

        let endpoint = collector
            .get_endpoint_metrics(EndpointKind::Comments)
            .await
            .unwrap();
        assert_eq!(endpoint.request_count, 2);
        assert_eq!(endpoint.success_rate(), 0.5);
        assert_eq!(endpoint.average_response_time(), Duration::from_millis(200));
        assert_eq!(endpoint.min_response_time, Duration::from_millis(150));
        assert_eq!(endpoint.max_response_time, Duration::from_millis(250));
        assert_eq!(endpoint.last_error_code.as_deref(), Some("REDDIT_API"));

        assert!(collector
            .get_endpoint_metrics(EndpointKind::SearchPage)
            .await
            .is_none());

        collector.reset_metrics().await;
        assert_eq!(collector.get_metrics().await.total_requests, 0);
    }
}
