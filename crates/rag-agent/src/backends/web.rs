//! Web-search backend: an HTTP GET against a search provider's API.

use std::time::Duration;

use async_trait::async_trait;
use rag_core::{BackendError, ContextItem, RetrievalBackend, RetrievalMode, RetrievalResult, SourceKind};
use serde::Deserialize;
use tracing::warn;

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    url: String,
    snippet: String,
    #[serde(default)]
    relevance: Option<f64>,
}

/// Default number of top-ranked web results retained per query.
const DEFAULT_TOP_K: usize = 5;

pub struct WebSearchBackend {
    client: reqwest::Client,
    search_url: String,
    api_key: String,
    timeout: Duration,
    top_k: usize,
}

impl WebSearchBackend {
    pub fn new(search_url: String, api_key: String, timeout_seconds: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            search_url,
            api_key,
            timeout: Duration::from_secs(timeout_seconds),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

#[async_trait]
impl RetrievalBackend for WebSearchBackend {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Web
    }

    async fn retrieve(&self, query_text: &str, _mode: RetrievalMode) -> RetrievalResult {
        let response = self
            .client
            .get(&self.search_url)
            .bearer_auth(&self.api_key)
            .query(&[("q", query_text)])
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return RetrievalResult::from_error(
                    SourceKind::Web,
                    &BackendError::Timeout {
                        source_kind: "web".to_string(),
                        timeout_secs: self.timeout.as_secs(),
                    },
                )
            }
            Err(e) => {
                warn!(error = %e, "web search request failed");
                return RetrievalResult::from_error(
                    SourceKind::Web,
                    &BackendError::Unavailable {
                        source_kind: "web".to_string(),
                        reason: e.to_string(),
                    },
                );
            }
        };

        if !response.status().is_success() {
            return RetrievalResult::from_error(
                SourceKind::Web,
                &BackendError::Protocol {
                    source_kind: "web".to_string(),
                    reason: format!("HTTP {}", response.status()),
                },
            );
        }

        match response.json::<SearchResponse>().await {
            Ok(parsed) => {
                let items = parsed
                    .results
                    .into_iter()
                    .take(self.top_k)
                    .map(|result| ContextItem {
                        text: result.snippet,
                        source_id: result.url,
                        score: result.relevance.unwrap_or(0.5),
                        entities: None,
                        mode: None,
                    })
                    .collect();
                RetrievalResult {
                    source_kind: Some(SourceKind::Web),
                    items,
                    raw_metadata: Default::default(),
                    confidence: None,
                }
            }
            Err(e) => RetrievalResult::from_error(
                SourceKind::Web,
                &BackendError::Protocol {
                    source_kind: "web".to_string(),
                    reason: e.to_string(),
                },
            ),
        }
    }
}
