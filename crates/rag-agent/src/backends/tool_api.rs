//! Tool/API backend: invokes a caller-supplied string-in/string-out async
//! function. This is the integration seam for whatever live computation or
//! external service the deployment needs — the workflow engine only ever
//! sees a `RetrievalResult`, never the underlying tool.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rag_core::{BackendError, ContextItem, RetrievalBackend, RetrievalMode, RetrievalResult, SourceKind};

type ToolFn = dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<String, String>> + Send>> + Send + Sync;

pub struct ToolApiBackend {
    name: String,
    call: Arc<ToolFn>,
    timeout: Duration,
}

impl ToolApiBackend {
    pub fn new<F, Fut>(name: impl Into<String>, timeout_seconds: u64, call: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, String>> + Send + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(move |input| Box::pin(call(input))),
            timeout: Duration::from_secs(timeout_seconds),
        }
    }
}

#[async_trait]
impl RetrievalBackend for ToolApiBackend {
    fn source_kind(&self) -> SourceKind {
        SourceKind::ToolApi
    }

    async fn retrieve(&self, query_text: &str, _mode: RetrievalMode) -> RetrievalResult {
        let call = self.call.clone();
        let input = query_text.to_string();
        match tokio::time::timeout(self.timeout, async move { call(input).await }).await {
            Ok(Ok(text)) => RetrievalResult {
                source_kind: Some(SourceKind::ToolApi),
                items: vec![ContextItem {
                    text,
                    source_id: self.name.clone(),
                    score: 1.0,
                    entities: None,
                    mode: None,
                }],
                raw_metadata: Default::default(),
                confidence: Some(1.0),
            },
            Ok(Err(reason)) => RetrievalResult::from_error(
                SourceKind::ToolApi,
                &BackendError::Protocol {
                    source_kind: "tool_api".to_string(),
                    reason,
                },
            ),
            Err(_) => RetrievalResult::from_error(
                SourceKind::ToolApi,
                &BackendError::Timeout {
                    source_kind: "tool_api".to_string(),
                    timeout_secs: self.timeout.as_secs(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_call_yields_one_context_item_named_for_the_tool() {
        let backend = ToolApiBackend::new("calculator", 5, |input| async move {
            Ok(format!("result for {input}"))
        });
        let result = backend.retrieve("2+2", RetrievalMode(None)).await;
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].source_id, "calculator");
        assert_eq!(result.items[0].text, "result for 2+2");
        assert!(result.raw_metadata.is_empty());
    }

    #[tokio::test]
    async fn failing_call_yields_empty_result_with_protocol_error_metadata() {
        let backend =
            ToolApiBackend::new("flaky", 5, |_input| async move { Err("boom".to_string()) });
        let result = backend.retrieve("anything", RetrievalMode(None)).await;
        assert!(result.items.is_empty());
        assert!(result.raw_metadata.contains_key("error"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out_rather_than_hanging() {
        let backend = ToolApiBackend::new("slow", 1, |_input| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        });
        let result = backend.retrieve("anything", RetrievalMode(None)).await;
        assert!(result.items.is_empty());
        assert!(result
            .raw_metadata
            .get("error")
            .is_some_and(|e| e.contains("timed out")));
    }
}
