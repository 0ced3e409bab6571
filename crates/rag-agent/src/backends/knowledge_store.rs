//! Knowledge-store backend: an HTTP POST to an internal retrieval service.

use std::time::Duration;

use async_trait::async_trait;
use rag_core::{BackendError, ContextItem, RetrievalBackend, RetrievalMode, RetrievalResult, SourceKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    mode: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    items: Vec<ResponseItem>,
}

#[derive(Deserialize)]
struct ResponseItem {
    text: String,
    source_id: String,
    score: f64,
    #[serde(default)]
    entities: Option<Vec<String>>,
}

pub struct KnowledgeStoreBackend {
    client: reqwest::Client,
    query_url: String,
    timeout: Duration,
}

impl KnowledgeStoreBackend {
    pub fn new(base_url: String, query_path: String, timeout_seconds: u64) -> Self {
        let query_url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            query_path.trim_start_matches('/')
        );
        Self {
            client: reqwest::Client::new(),
            query_url,
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

#[async_trait]
impl RetrievalBackend for KnowledgeStoreBackend {
    fn source_kind(&self) -> SourceKind {
        SourceKind::KnowledgeStore
    }

    async fn retrieve(&self, query_text: &str, mode: RetrievalMode) -> RetrievalResult {
        let body = QueryRequest {
            query: query_text,
            mode: mode.0.map(|m| match m {
                rag_core::KnowledgeStoreMode::Local => "local",
                rag_core::KnowledgeStoreMode::Global => "global",
                rag_core::KnowledgeStoreMode::Hybrid => "hybrid",
            }),
        };

        let response = self
            .client
            .post(&self.query_url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return RetrievalResult::from_error(
                    SourceKind::KnowledgeStore,
                    &BackendError::Timeout {
                        source_kind: "knowledge_store".to_string(),
                        timeout_secs: self.timeout.as_secs(),
                    },
                )
            }
            Err(e) => {
                warn!(error = %e, "knowledge store request failed");
                return RetrievalResult::from_error(
                    SourceKind::KnowledgeStore,
                    &BackendError::Unavailable {
                        source_kind: "knowledge_store".to_string(),
                        reason: e.to_string(),
                    },
                );
            }
        };

        if !response.status().is_success() {
            return RetrievalResult::from_error(
                SourceKind::KnowledgeStore,
                &BackendError::Protocol {
                    source_kind: "knowledge_store".to_string(),
                    reason: format!("HTTP {}", response.status()),
                },
            );
        }

        match response.json::<QueryResponse>().await {
            Ok(parsed) => {
                let items = parsed
                    .items
                    .into_iter()
                    .map(|item| ContextItem {
                        text: item.text,
                        source_id: item.source_id,
                        score: item.score,
                        entities: item.entities,
                        mode: mode.0.map(|m| m.to_string()),
                    })
                    .collect();
                RetrievalResult {
                    source_kind: Some(SourceKind::KnowledgeStore),
                    items,
                    raw_metadata: Default::default(),
                    confidence: None,
                }
            }
            Err(e) => RetrievalResult::from_error(
                SourceKind::KnowledgeStore,
                &BackendError::Protocol {
                    source_kind: "knowledge_store".to_string(),
                    reason: e.to_string(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_url_joins_base_and_path_regardless_of_slashes() {
        let a = KnowledgeStoreBackend::new(
            "https://kb.example.com".to_string(),
            "query".to_string(),
            30,
        );
        let b = KnowledgeStoreBackend::new(
            "https://kb.example.com/".to_string(),
            "/query".to_string(),
            30,
        );
        assert_eq!(a.query_url, "https://kb.example.com/query");
        assert_eq!(b.query_url, "https://kb.example.com/query");
    }
}
