//! Retrieval Backends façade (C2).
//!
//! A single abstract operation, `retrieve`, dispatched by `SourceKind` — a
//! closed tagged union over the three backend kinds. Concrete backends
//! (knowledge store, web, tool/API) live in `rag-agent`; this module only
//! declares the trait, the wire-level types, and the deterministic
//! mode-selection heuristic, which is pure text analysis and has no
//! business living next to I/O.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

/// The three categories C2 dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    KnowledgeStore,
    Web,
    ToolApi,
}

impl SourceKind {
    /// Parse a model-produced tag into a `SourceKind`. Unknown tags are the
    /// caller's concern — treat `None` as a parse failure, not a silent
    /// default.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "knowledge_store" => Some(Self::KnowledgeStore),
            "web" => Some(Self::Web),
            "tool_api" => Some(Self::ToolApi),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::KnowledgeStore => "knowledge_store",
            Self::Web => "web",
            Self::ToolApi => "tool_api",
        }
    }

    /// Ranking priority used as a tie-breaker by the Context Compiler (C3):
    /// lower is higher priority. knowledge_store > tool_api > web.
    pub fn rank_priority(&self) -> u8 {
        match self {
            Self::KnowledgeStore => 0,
            Self::ToolApi => 1,
            Self::Web => 2,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Knowledge-store retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeStoreMode {
    Local,
    Global,
    Hybrid,
}

impl std::fmt::Display for KnowledgeStoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Local => "local",
            Self::Global => "global",
            Self::Hybrid => "hybrid",
        };
        write!(f, "{s}")
    }
}

/// Choose a knowledge-store mode from lexical heuristics on the query, used
/// when the caller does not force one.
pub fn select_mode(query_text: &str) -> KnowledgeStoreMode {
    let lower = query_text.to_lowercase();
    const COMPARATIVE_TERMS: &[&str] = &["compare", "vs", "versus", "differ"];
    if COMPARATIVE_TERMS.iter().any(|t| lower.contains(t)) {
        return KnowledgeStoreMode::Global;
    }

    let trimmed = lower.trim();
    let word_count = trimmed.split_whitespace().count();
    let is_short_what_is = (trimmed.starts_with("what is") || trimmed.starts_with("what's"))
        && word_count <= 6;
    if is_short_what_is {
        return KnowledgeStoreMode::Local;
    }

    KnowledgeStoreMode::Hybrid
}

/// One citable unit of evidence returned by a backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextItem {
    pub text: String,
    pub source_id: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Output of one C2 backend invocation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RetrievalResult {
    pub source_kind: Option<SourceKind>,
    pub items: Vec<ContextItem>,
    pub raw_metadata: HashMap<String, String>,
    pub confidence: Option<f64>,
}

impl RetrievalResult {
    pub fn empty(source_kind: SourceKind) -> Self {
        Self {
            source_kind: Some(source_kind),
            items: Vec::new(),
            raw_metadata: HashMap::new(),
            confidence: None,
        }
    }

    /// Build an empty result recording a backend error in `raw_metadata` —
    /// backends never raise past their boundary.
    pub fn from_error(source_kind: SourceKind, error: &BackendError) -> Self {
        let mut raw_metadata = HashMap::new();
        raw_metadata.insert("error".to_string(), error.to_string());
        Self {
            source_kind: Some(source_kind),
            items: Vec::new(),
            raw_metadata,
            confidence: Some(0.0),
        }
    }
}

/// Optional mode hint forwarded to the knowledge-store backend; ignored by
/// the web and tool/API backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalMode(pub Option<KnowledgeStoreMode>);

/// Uniform interface over knowledge store, web search, and tool/API
/// backends. Each implementation must honor a per-call timeout and must
/// never raise past this boundary — failures are folded into an empty
/// `RetrievalResult` with `raw_metadata["error"]` populated.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    fn source_kind(&self) -> SourceKind;

    async fn retrieve(&self, query_text: &str, mode: RetrievalMode) -> RetrievalResult;
}

/// Dispatches to the registered backend for a given `SourceKind`. Backends
/// are injected at construction — the engine holds no module-level state.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<SourceKind, Arc<dyn RetrievalBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    pub fn register(mut self, backend: Arc<dyn RetrievalBackend>) -> Self {
        self.backends.insert(backend.source_kind(), backend);
        self
    }

    pub fn is_registered(&self, kind: SourceKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// True once at least one backend has been registered. The engine uses
    /// this as its configuration gate instead of any env-derived setting,
    /// since backends are supplied by injection, not by reading `Config`.
    pub fn has_any(&self) -> bool {
        !self.backends.is_empty()
    }

    /// Retrieve from the backend for `kind`. If no backend is registered for
    /// that kind, returns an empty result with a protocol error recorded —
    /// the workflow proceeds with empty context rather than panicking.
    pub async fn retrieve(
        &self,
        kind: SourceKind,
        query_text: &str,
        mode: RetrievalMode,
    ) -> RetrievalResult {
        match self.backends.get(&kind) {
            Some(backend) => backend.retrieve(query_text, mode).await,
            None => RetrievalResult::from_error(
                kind,
                &BackendError::Unavailable {
                    source_kind: kind.to_string(),
                    reason: "no backend registered for this source kind".to_string(),
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selection_comparative() {
        assert_eq!(
            select_mode("compare Rust vs Go for web servers"),
            KnowledgeStoreMode::Global
        );
    }

    #[test]
    fn mode_selection_short_fact_seeking() {
        assert_eq!(
            select_mode("what is machine learning?"),
            KnowledgeStoreMode::Local
        );
    }

    #[test]
    fn mode_selection_default_hybrid() {
        assert_eq!(
            select_mode("explain the history of the internet in detail"),
            KnowledgeStoreMode::Hybrid
        );
    }

    #[test]
    fn source_kind_round_trips_through_tag() {
        for kind in [SourceKind::KnowledgeStore, SourceKind::Web, SourceKind::ToolApi] {
            assert_eq!(SourceKind::parse_tag(kind.as_tag()), Some(kind));
        }
        assert_eq!(SourceKind::parse_tag("nonsense"), None);
    }

    #[tokio::test]
    async fn registry_returns_empty_result_for_unregistered_backend() {
        let registry = BackendRegistry::new();
        let result = registry
            .retrieve(SourceKind::Web, "hello", RetrievalMode(None))
            .await;
        assert!(result.items.is_empty());
        assert!(result.raw_metadata.contains_key("error"));
    }
}
