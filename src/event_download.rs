// src/event_download.rs
use crate::config::SourceConfig;
use crate::errors::SourceFetchError;
use crate::event::Event;
use crate::event_factory::EventFactory;
use crate::query::{QueryResponseItem, RunQueryRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, error, info};
use reqwest::{Client, Response, Url};
use std::sync::Arc;
use std::time::Duration;

// ===== fetcher
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Runs `request` against `source` and returns the raw response items.
    async fn run_query(
        &self,
        source: &SourceConfig,
        request: &RunQueryRequest,
    ) -> Result<Vec<QueryResponseItem>, SourceFetchError>;
}

// ===== Live http fetcher
pub struct HttpSourceFetcher {
    client: Client,
}

impl HttpSourceFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

        let client: Client =
            reqwest::Client::builder().user_agent(APP_USER_AGENT).timeout(timeout).build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn run_query(
        &self,
        source: &SourceConfig,
        request: &RunQueryRequest,
    ) -> Result<Vec<QueryResponseItem>, SourceFetchError> {
        let category = source.category;
        let endpoint = source.query_endpoint();
        let url: Url = Url::parse(&endpoint)
            .map_err(|_| SourceFetchError::InvalidEndpoint { category, endpoint: endpoint.clone() })?;

        info!("HttpSourceFetcher: querying {} at {}", category, url);
        let response: Response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|source| SourceFetchError::NetworkError { category, source })?;

        if !response.status().is_success() {
            return Err(SourceFetchError::BadStatus { category, status: response.status() });
        }

        let body: String = response
            .text()
            .await
            .map_err(|source| SourceFetchError::NetworkError { category, source })?;
        debug!("HttpSourceFetcher: {} answered with {} bytes", category, body.len());

        serde_json::from_str(&body).map_err(|e| SourceFetchError::MalformedResponse {
            category,
            reason: e.to_string(),
        })
    }
}

// ===== aggregator
/// Queries every configured source for a date range and merges the results.
/// Holds no state between calls.
pub struct EventAggregator {
    fetcher: Arc<dyn SourceFetcher>,
    sources: Vec<SourceConfig>,
}

impl EventAggregator {
    pub fn new(fetcher: Arc<dyn SourceFetcher>, sources: Vec<SourceConfig>) -> Self {
        Self { fetcher, sources }
    }

    /// Events of all sources with `start <= date <= end`, concatenated in
    /// source order. A failing source contributes nothing; this never fails.
    pub async fn fetch_events(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Event> {
        let request = RunQueryRequest::date_range(start, end);

        // All queries are polled together; join_all waits for every one of
        // them instead of stopping at the first error.
        let outcomes: Vec<Result<Vec<Event>, SourceFetchError>> =
            join_all(self.sources.iter().map(|source| self.fetch_source(source, &request))).await;

        let mut events: Vec<Event> = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(source_events) => events.extend(source_events),
                Err(e) => error!("EventAggregator: dropping {} events: {}", e.category(), e),
            }
        }
        info!("EventAggregator: {} events between {} and {}", events.len(), start, end);
        events
    }

    async fn fetch_source(
        &self,
        source: &SourceConfig,
        request: &RunQueryRequest,
    ) -> Result<Vec<Event>, SourceFetchError> {
        let items: Vec<QueryResponseItem> = self.fetcher.run_query(source, request).await?;
        Ok(EventFactory::new(source.category).create_events(items))
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{FakeSourceFetcher, documents};
    use super::*;
    use crate::config::default_sources;
    use crate::event::Category;
    use chrono::TimeZone;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn march() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap(),
        )
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(Event::id).collect()
    }

    #[tokio::test]
    async fn test_fetch_events_concatenates_sources() {
        let fetcher = FakeSourceFetcher::new()
            .respond(Category::Circle, &documents(&[("c1", "2024-03-02T10:00:00Z", "practice")]))
            .respond(Category::JobHunting, &documents(&[("j1", "2024-03-05T10:00:00Z", "")]))
            .respond(
                Category::University,
                &documents(&[
                    ("u1", "2024-03-07T10:00:00Z", "exam"),
                    ("u2", "2024-03-08T10:00:00Z", "exam"),
                ]),
            );
        let aggregator = EventAggregator::new(Arc::new(fetcher), default_sources());

        let (start, end) = march();
        let events = aggregator.fetch_events(start, end).await;

        assert_eq!(ids(&events), vec!["c1", "j1", "u1", "u2"]);
        assert_eq!(events[0].category(), Category::Circle);
        assert_eq!(events[1].category(), Category::JobHunting);
        assert_eq!(events[3].category(), Category::University);
    }

    #[tokio::test]
    async fn test_failing_source_contributes_nothing() {
        let fetcher = Arc::new(
            FakeSourceFetcher::new()
                .respond(Category::Circle, &documents(&[("c1", "2024-03-02T10:00:00Z", "")]))
                .fail(Category::JobHunting)
                .respond(Category::University, &documents(&[("u1", "2024-03-07T10:00:00Z", "")])),
        );
        let aggregator = EventAggregator::new(fetcher.clone(), default_sources());

        let (start, end) = march();
        let events = aggregator.fetch_events(start, end).await;

        assert_eq!(ids(&events), vec!["c1", "u1"]);
        assert_eq!(fetcher.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_all_sources_failing_yields_empty_list() {
        let fetcher = FakeSourceFetcher::new()
            .fail(Category::Circle)
            .fail(Category::JobHunting)
            .fail(Category::University);
        let aggregator = EventAggregator::new(Arc::new(fetcher), default_sources());

        let (start, end) = march();
        assert!(aggregator.fetch_events(start, end).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sources_are_queried_concurrently() {
        let fetcher = FakeSourceFetcher::new()
            .respond(Category::Circle, &documents(&[("c1", "2024-03-02T10:00:00Z", "")]))
            .delay(Category::Circle, Duration::from_millis(300))
            .fail(Category::JobHunting)
            .delay(Category::JobHunting, Duration::from_millis(200))
            .respond(Category::University, &documents(&[("u1", "2024-03-07T10:00:00Z", "")]))
            .delay(Category::University, Duration::from_millis(100));
        let aggregator = EventAggregator::new(Arc::new(fetcher), default_sources());

        let (start, end) = march();
        let started = tokio::time::Instant::now();
        let events = aggregator.fetch_events(start, end).await;
        let elapsed = started.elapsed();

        // The slowest source bounds the wait; one after another would take 600ms.
        assert!(elapsed >= Duration::from_millis(300), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(600), "elapsed {:?}", elapsed);
        assert_eq!(ids(&events), vec!["c1", "u1"]);
    }

    #[tokio::test]
    async fn test_unreachable_source_is_a_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/circle/documents:runQuery"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(documents(&[("c1", "2024-03-02T10:00:00Z", "")])),
            )
            .mount(&server)
            .await;

        // Nothing listens on a port once its listener is dropped.
        let closed_port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let sources = vec![
            SourceConfig::new(Category::Circle, format!("{}/circle/documents/event", server.uri())),
            SourceConfig::new(
                Category::JobHunting,
                format!("http://127.0.0.1:{}/jobs/documents/event", closed_port),
            ),
        ];
        let fetcher = Arc::new(HttpSourceFetcher::new(Duration::from_secs(5)).unwrap());
        let aggregator = EventAggregator::new(fetcher.clone(), sources.clone());

        let (start, end) = march();
        assert_eq!(ids(&aggregator.fetch_events(start, end).await), vec!["c1"]);

        let unreachable =
            fetcher.run_query(&sources[1], &RunQueryRequest::date_range(start, end)).await;
        match unreachable {
            Err(SourceFetchError::NetworkError { category, .. }) => {
                assert_eq!(category, Category::JobHunting)
            }
            other => panic!("expected a network error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_fetcher_posts_structured_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/circle/documents:runQuery"))
            .and(body_partial_json(serde_json::json!({
                "structuredQuery": { "from": [{ "collectionId": "event" }] }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(documents(&[("c1", "2024-03-02T10:00:00Z", "practice")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source =
            SourceConfig::new(Category::Circle, format!("{}/circle/documents/event", server.uri()));
        let (start, end) = march();
        let fetcher = HttpSourceFetcher::new(Duration::from_secs(5)).unwrap();

        let items = fetcher.run_query(&source, &RunQueryRequest::date_range(start, end)).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].document.as_ref().unwrap().id(), "c1");
    }

    #[tokio::test]
    async fn test_http_aggregation_survives_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/circle/documents:runQuery"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(documents(&[("c1", "2024-03-02T10:00:00Z", "")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/jobs/documents:runQuery"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/uni/documents:runQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let sources = vec![
            SourceConfig::new(Category::Circle, format!("{}/circle/documents/event", server.uri())),
            SourceConfig::new(Category::JobHunting, format!("{}/jobs/documents/event", server.uri())),
            SourceConfig::new(Category::University, format!("{}/uni/documents/event", server.uri())),
        ];
        let fetcher = Arc::new(HttpSourceFetcher::new(Duration::from_secs(5)).unwrap());
        let aggregator = EventAggregator::new(fetcher.clone(), sources.clone());

        let (start, end) = march();
        let events = aggregator.fetch_events(start, end).await;
        assert_eq!(ids(&events), vec!["c1"]);

        // SAD PATHS
        let request = RunQueryRequest::date_range(start, end);
        let status = fetcher.run_query(&sources[1], &request).await;
        assert!(matches!(status, Err(SourceFetchError::BadStatus { .. })));
        let malformed = fetcher.run_query(&sources[2], &request).await;
        assert!(matches!(malformed, Err(SourceFetchError::MalformedResponse { .. })));
    }
}
