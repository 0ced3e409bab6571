//! Integration-level check that the concrete backends in this crate plug
//! into `rag-core`'s `BackendRegistry` the way the workflow engine expects:
//! dispatch by `SourceKind`, never panicking, falling back to an empty
//! result with a recorded error for an unregistered kind.

use std::sync::Arc;

use rag_agent::{ToolApiBackend, WebSearchBackend};
use rag_core::{BackendRegistry, RetrievalMode, SourceKind};

#[tokio::test]
async fn registry_dispatches_to_the_matching_backend() {
    let registry = BackendRegistry::new().register(Arc::new(ToolApiBackend::new(
        "echo",
        5,
        |input| async move { Ok(input) },
    )));

    let result = registry
        .retrieve(SourceKind::ToolApi, "hello", RetrievalMode(None))
        .await;

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].source_id, "echo");
    assert_eq!(result.items[0].text, "hello");
}

#[tokio::test]
async fn registry_reports_missing_backend_without_panicking() {
    let registry = BackendRegistry::new().register(Arc::new(ToolApiBackend::new(
        "echo",
        5,
        |input| async move { Ok(input) },
    )));

    // No web backend registered — the workflow engine must still get a
    // usable (if empty) result rather than a panic or dangling call.
    let result = registry
        .retrieve(SourceKind::Web, "latest news", RetrievalMode(None))
        .await;

    assert!(result.items.is_empty());
    assert!(result.raw_metadata.contains_key("error"));
}

#[test]
fn web_backend_can_be_constructed_with_a_custom_top_k() {
    // Construction alone (no network call) exercises the builder wiring
    // that `main.rs` relies on when assembling the registry from config.
    let _backend = WebSearchBackend::new(
        "https://search.example.com/v1".to_string(),
        "test-key".to_string(),
        30,
    )
    .with_top_k(3);
}
