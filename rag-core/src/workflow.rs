//! Workflow Engine (C5) — the twelve-node state machine.
//!
//! A sequential, single-threaded-per-run state machine whose only
//! suspension points are oracle and backend calls. Every transition is a
//! pure function of the current state plus one fresh signal (an oracle
//! reply or a retrieval result), and decisions are recorded in an
//! append-only transition history for replay.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::{Config, ConfigOverrides};
use crate::context_compiler::{self, CompileBudget, CompiledContext};
use crate::error::WorkflowError;
use crate::grader::{Grader, GradingResult};
use crate::oracle::LlmOracle;
use crate::query::Query;
use crate::retrieval::{select_mode, BackendRegistry, RetrievalMode, SourceKind};
use crate::session_store::SharedSessionStore;

/// The twelve workflow nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Start,
    Rewrite,
    PublishRewrittenQuery,
    DecideNeedInfo,
    ChooseSource,
    Retrieve,
    PublishContext,
    PublishQueryForAnswer,
    GenerateAnswer,
    DecideRelevant,
    Terminal,
    Loopback,
}

impl Node {
    /// The fixed legal edge set of the twelve-node graph. `decision` is
    /// `Some` only at the two branching nodes (N4, N10) and at N12.
    fn is_legal_edge(from: Node, to: Node) -> bool {
        use Node::*;
        matches!(
            (from, to),
            (Start, Rewrite)
                | (Rewrite, PublishRewrittenQuery)
                | (PublishRewrittenQuery, DecideNeedInfo)
                | (DecideNeedInfo, ChooseSource)
                | (DecideNeedInfo, Loopback)
                | (ChooseSource, Retrieve)
                | (Retrieve, PublishContext)
                | (PublishContext, PublishQueryForAnswer)
                | (PublishQueryForAnswer, GenerateAnswer)
                | (GenerateAnswer, DecideRelevant)
                | (DecideRelevant, Terminal)
                | (DecideRelevant, Loopback)
                | (Loopback, Rewrite)
        )
    }
}

/// One traversed edge, appended to `WorkflowState.history` at every
/// transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTransition {
    pub from_node: Node,
    pub to_node: Node,
    pub decision: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The best answer observed so far across all iterations, retained so N12
/// can fall back to it once retries are exhausted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateAnswer {
    pub answer_text: String,
    pub grading: GradingResult,
    pub sources: Vec<String>,
    pub retrieval_method: String,
    pub query_rewrites: u32,
}

/// Distinguished terminal reason, recorded on the snapshot when a run ends
/// other than by a plain accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    Accepted,
    FallbackAccepted,
    Exhausted,
    Cancelled,
}

/// One per in-flight request. Mutated only by the Workflow Engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub current_node: Node,
    pub retry_count: u32,
    pub max_retries: u32,
    pub acceptance_threshold: f64,
    pub started_at: DateTime<Utc>,
    pub history: Vec<NodeTransition>,
    pub query: Query,
    pub best_candidate: Option<CandidateAnswer>,
    pub last_retrieval_source: Option<SourceKind>,
    pub terminal_reason: Option<TerminalReason>,
    /// Raw failure cause recorded when a decision node applied a
    /// conservative default after an oracle error.
    pub last_oracle_failure: Option<String>,
}

impl WorkflowState {
    pub fn new(max_retries: u32, acceptance_threshold: f64) -> Self {
        Self {
            current_node: Node::Start,
            retry_count: 0,
            max_retries,
            acceptance_threshold,
            started_at: Utc::now(),
            history: Vec::new(),
            query: Query::new(String::new()),
            best_candidate: None,
            last_retrieval_source: None,
            terminal_reason: None,
            last_oracle_failure: None,
        }
    }

    fn push_transition(&mut self, to: Node, decision: Option<String>) {
        debug_assert!(
            Node::is_legal_edge(self.current_node, to),
            "illegal transition {:?} -> {:?}",
            self.current_node,
            to
        );
        self.history.push(NodeTransition {
            from_node: self.current_node,
            to_node: to,
            decision,
            timestamp: Utc::now(),
        });
        self.current_node = to;
    }

    fn consider_candidate(&mut self, candidate: CandidateAnswer) {
        let replace = match &self.best_candidate {
            None => true,
            Some(existing) => candidate.grading.overall > existing.grading.overall,
        };
        if replace {
            self.best_candidate = Some(candidate);
        }
    }
}

/// Terminal output of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResponse {
    pub answer: String,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub metadata: FinalResponseMetadata,
    pub grading_scores: GradingResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalResponseMetadata {
    pub retrieval_method: String,
    pub query_rewrites: u32,
    pub workflow_completed_at_node: u8,
    pub degraded: bool,
}

/// The twelve-node state machine. Holds injected, stateless-as-possible
/// adapters and drives a single run of `process_query` to completion,
/// cancellation, or exhaustion.
pub struct WorkflowEngine {
    oracle: Arc<dyn LlmOracle>,
    backends: BackendRegistry,
    session_store: SharedSessionStore,
}

impl WorkflowEngine {
    pub fn new(
        oracle: Arc<dyn LlmOracle>,
        backends: BackendRegistry,
        session_store: SharedSessionStore,
    ) -> Self {
        Self {
            oracle,
            backends,
            session_store,
        }
    }

    /// The sole public entry point.
    pub async fn process_query(
        &self,
        original_text: &str,
        overrides: ConfigOverrides,
    ) -> Result<FinalResponse, WorkflowError> {
        self.process_query_with_cancellation(
            original_text,
            overrides,
            CancellationToken::new(),
        )
        .await
    }

    /// Same as `process_query` but accepts a caller-owned cancellation
    /// token, checked at every suspension point.
    pub async fn process_query_with_cancellation(
        &self,
        original_text: &str,
        overrides: ConfigOverrides,
        cancel: CancellationToken,
    ) -> Result<FinalResponse, WorkflowError> {
        let config = Config::with_overrides(overrides);
        if !self.backends.has_any() {
            return Err(WorkflowError::Configuration(
                "no retrieval backend registered: the engine was constructed with an empty BackendRegistry"
                    .to_string(),
            ));
        }

        let query_id = uuid::Uuid::new_v4().to_string();
        let wall_clock = Duration::from_secs(config.workflow.wall_clock_timeout_seconds);

        let run = self.run(
            &query_id,
            original_text,
            &config,
            cancel.clone(),
        );

        match tokio::time::timeout(wall_clock, run).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                let mut state = self
                    .session_store
                    .get(&query_id)
                    .await
                    .unwrap_or_else(|| {
                        WorkflowState::new(
                            config.workflow.max_retries,
                            config.workflow.acceptance_threshold,
                        )
                    });
                state.terminal_reason = Some(TerminalReason::Cancelled);
                self.session_store.put(&query_id, state).await;
                Err(WorkflowError::Cancelled {
                    reason: "wall-clock timeout exceeded".to_string(),
                })
            }
        }
    }

    async fn run(
        &self,
        query_id: &str,
        original_text: &str,
        config: &Config,
        cancel: CancellationToken,
    ) -> Result<FinalResponse, WorkflowError> {
        let grader = Grader::new(config.workflow.acceptance_threshold);

        let mut state = WorkflowState::new(
            config.workflow.max_retries,
            config.workflow.acceptance_threshold,
        );
        state.query = Query::new(original_text);
        self.session_store.put(query_id, state.clone()).await;

        loop {
            if cancel.is_cancelled() {
                return self.cancel_run(query_id, state).await;
            }

            // N2: rewrite. The very first pass records the N1->N2 edge; a
            // loopback re-entry lands here with `current_node` already at
            // `Loopback` and does not get its own history entry — the
            // decision to loop was already recorded when N12 was entered,
            // so N12->N2 is bookkeeping rather than a fresh productive edge.
            if state.current_node == Node::Start {
                state.push_transition(Node::Rewrite, None);
            } else {
                state.current_node = Node::Rewrite;
            }
            self.session_store.put(query_id, state.clone()).await;
            let rewritten = match self
                .oracle
                .rewrite(&state.query.current_text, &state.query.enhancement_hints)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(query_id, error = %e, "rewrite failed, keeping prior text");
                    state.last_oracle_failure = Some(e.to_string());
                    state.query.current_text.clone()
                }
            };
            state.query.set_rewritten(rewritten);

            if cancel.is_cancelled() {
                return self.cancel_run(query_id, state).await;
            }

            // N3: publish updated query
            state.push_transition(Node::PublishRewrittenQuery, None);
            self.session_store.put(query_id, state.clone()).await;

            // N4: decide need more info?
            state.push_transition(Node::DecideNeedInfo, None);
            self.session_store.put(query_id, state.clone()).await;
            let needs_info = match self
                .oracle
                .needs_more_information(&state.query.current_text)
                .await
            {
                Ok(decision) => decision.needs_more_information,
                Err(e) => {
                    // Conservative default: YES, so the workflow still makes
                    // progress toward retrieval.
                    warn!(query_id, error = %e, "needs_more_information failed, defaulting YES");
                    state.last_oracle_failure = Some(e.to_string());
                    true
                }
            };

            if !needs_info {
                state.push_transition(Node::Loopback, Some("NO".to_string()));
                self.session_store.put(query_id, state.clone()).await;
                match self.loopback_from_n4(&mut state) {
                    LoopbackOutcome::Continue => continue,
                    LoopbackOutcome::Terminal => {
                        return self.finalize_at_n12(query_id, state).await;
                    }
                }
            }
            state.push_transition(Node::ChooseSource, Some("YES".to_string()));
            self.session_store.put(query_id, state.clone()).await;

            if cancel.is_cancelled() {
                return self.cancel_run(query_id, state).await;
            }

            // N5: choose source
            let source_kind = match self.oracle.choose_source(&state.query.current_text).await {
                Ok(kind) => kind,
                Err(e) => {
                    warn!(query_id, error = %e, "choose_source failed, defaulting knowledge_store");
                    state.last_oracle_failure = Some(e.to_string());
                    SourceKind::KnowledgeStore
                }
            };
            state.last_retrieval_source = Some(source_kind);

            if cancel.is_cancelled() {
                return self.cancel_run(query_id, state).await;
            }

            // N6: retrieve from source
            state.push_transition(Node::Retrieve, Some(source_kind.to_string()));
            self.session_store.put(query_id, state.clone()).await;
            let mode = if source_kind == SourceKind::KnowledgeStore {
                RetrievalMode(Some(select_mode(&state.query.current_text)))
            } else {
                RetrievalMode(None)
            };
            let retrieval_result = self
                .backends
                .retrieve(source_kind, &state.query.current_text, mode)
                .await;

            // N7: publish compiled context
            state.push_transition(Node::PublishContext, None);
            let compiled = context_compiler::compile(&[retrieval_result], CompileBudget::default());
            self.session_store.put(query_id, state.clone()).await;

            if cancel.is_cancelled() {
                return self.cancel_run(query_id, state).await;
            }

            // N8: publish updated query (ahead of generation)
            state.push_transition(Node::PublishQueryForAnswer, None);
            self.session_store.put(query_id, state.clone()).await;

            if cancel.is_cancelled() {
                return self.cancel_run(query_id, state).await;
            }

            // N9: generate answer
            state.push_transition(Node::GenerateAnswer, None);
            self.session_store.put(query_id, state.clone()).await;
            let answer_text = match self
                .oracle
                .answer(&state.query.current_text, &compiled)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(query_id, error = %e, "answer generation failed");
                    state.last_oracle_failure = Some(e.to_string());
                    String::new()
                }
            };

            if cancel.is_cancelled() {
                return self.cancel_run(query_id, state).await;
            }

            let grading = grader
                .grade(
                    self.oracle.as_ref(),
                    &state.query.current_text,
                    &compiled,
                    &answer_text,
                    state.last_retrieval_source,
                )
                .await;

            let grading = match grading {
                Ok(g) => Some(g),
                Err(e) => {
                    warn!(query_id, error = %e, "grading failed");
                    state.last_oracle_failure = Some(e.to_string());
                    None
                }
            };

            if let Some(grading) = &grading {
                if !answer_text.is_empty() {
                    state.consider_candidate(CandidateAnswer {
                        answer_text: answer_text.clone(),
                        grading: grading.clone(),
                        sources: distinct_source_ids(&compiled),
                        retrieval_method: source_kind.to_string(),
                        query_rewrites: state.retry_count + 1,
                    });
                }
            }

            // N10: decide answer relevant?
            state.push_transition(Node::DecideRelevant, None);
            self.session_store.put(query_id, state.clone()).await;

            let accept = match &grading {
                Some(g) => !g.needs_improvement,
                // Oracle failure at this decision node: conservative default
                // NO, counted against the retry budget.
                None => false,
            };

            if accept {
                state.push_transition(Node::Terminal, Some("YES".to_string()));
                state.terminal_reason = Some(TerminalReason::Accepted);
                self.session_store.put(query_id, state.clone()).await;
                let grading = grading.expect("accept implies a grading result");
                return Ok(FinalResponse {
                    answer: answer_text,
                    confidence: grading.overall,
                    sources: distinct_source_ids(&compiled),
                    metadata: FinalResponseMetadata {
                        retrieval_method: source_kind.to_string(),
                        query_rewrites: state.retry_count + 1,
                        workflow_completed_at_node: 11,
                        degraded: state.last_oracle_failure.is_some(),
                    },
                    grading_scores: grading,
                });
            }

            state.push_transition(Node::Loopback, Some("NO".to_string()));
            self.session_store.put(query_id, state.clone()).await;

            let hint = grading
                .as_ref()
                .map(|g| g.improvement_reason.clone())
                .unwrap_or_else(|| "the prior answer could not be graded".to_string());

            if state.retry_count < state.max_retries {
                state.retry_count += 1;
                state.query.push_hint(hint);
                continue;
            }

            return self.finalize_at_n12(query_id, state).await;
        }
    }

    fn loopback_from_n4(&self, state: &mut WorkflowState) -> LoopbackOutcome {
        if state.retry_count < state.max_retries {
            state.retry_count += 1;
            state.query.push_hint(
                "the prior rewrite did not surface a retrieval need; reformulate for concreteness"
                    .to_string(),
            );
            LoopbackOutcome::Continue
        } else {
            LoopbackOutcome::Terminal
        }
    }

    async fn finalize_at_n12(
        &self,
        query_id: &str,
        mut state: WorkflowState,
    ) -> Result<FinalResponse, WorkflowError> {
        match state.best_candidate.clone() {
            Some(candidate) => {
                state.terminal_reason = Some(TerminalReason::FallbackAccepted);
                self.session_store.put(query_id, state.clone()).await;
                Ok(FinalResponse {
                    answer: candidate.answer_text,
                    confidence: candidate.grading.overall,
                    sources: candidate.sources,
                    metadata: FinalResponseMetadata {
                        retrieval_method: candidate.retrieval_method,
                        query_rewrites: candidate.query_rewrites,
                        workflow_completed_at_node: 12,
                        degraded: true,
                    },
                    grading_scores: candidate.grading,
                })
            }
            None => {
                state.terminal_reason = Some(TerminalReason::Exhausted);
                self.session_store.put(query_id, state.clone()).await;
                Err(WorkflowError::Exhausted {
                    last_failure_cause: state
                        .last_oracle_failure
                        .unwrap_or_else(|| "no candidate answer ever graded".to_string()),
                })
            }
        }
    }

    async fn cancel_run(
        &self,
        query_id: &str,
        mut state: WorkflowState,
    ) -> Result<FinalResponse, WorkflowError> {
        state.terminal_reason = Some(TerminalReason::Cancelled);
        self.session_store.put(query_id, state).await;
        Err(WorkflowError::Cancelled {
            reason: "cooperative cancellation requested".to_string(),
        })
    }
}

enum LoopbackOutcome {
    Continue,
    Terminal,
}

fn distinct_source_ids(compiled: &CompiledContext) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut sources = Vec::new();
    for item in &compiled.ordered_items {
        if seen.insert(item.source_id.clone()) {
            sources.push(item.source_id.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grader::RawGrade;
    use crate::retrieval::{ContextItem, RetrievalBackend, RetrievalResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// A fake oracle whose answers are scripted per call count, so tests can
    /// drive specific scenarios deterministically without a network call.
    struct FakeOracle {
        /// Sequence of grades to return from `grade`, one per call; the last
        /// value is reused once the sequence is exhausted.
        grade_sequence: Vec<RawGrade>,
        grade_calls: AtomicUsize,
        /// If true, `needs_more_information` always answers NO.
        skip_retrieval: bool,
        source: SourceKind,
        /// If true, every `retrieve`-feeding answer call returns empty text.
        empty_answers: bool,
    }

    fn good_grade() -> RawGrade {
        RawGrade {
            relevancy: 0.9,
            faithfulness: 0.9,
            context_quality: 0.9,
            coherence: 0.9,
            improvement_reason: String::new(),
        }
    }

    fn bad_grade() -> RawGrade {
        RawGrade {
            relevancy: 0.3,
            faithfulness: 0.3,
            context_quality: 0.2,
            coherence: 0.3,
            improvement_reason: "context was too sparse".to_string(),
        }
    }

    impl FakeOracle {
        fn happy_path() -> Self {
            Self {
                grade_sequence: vec![good_grade()],
                grade_calls: AtomicUsize::new(0),
                skip_retrieval: false,
                source: SourceKind::KnowledgeStore,
                empty_answers: false,
            }
        }

        fn always_needs_retry() -> Self {
            Self {
                grade_sequence: vec![bad_grade()],
                grade_calls: AtomicUsize::new(0),
                skip_retrieval: false,
                source: SourceKind::KnowledgeStore,
                empty_answers: false,
            }
        }

        fn skip_retrieval_entirely() -> Self {
            Self {
                grade_sequence: vec![bad_grade()],
                grade_calls: AtomicUsize::new(0),
                skip_retrieval: true,
                source: SourceKind::KnowledgeStore,
                empty_answers: true,
            }
        }
    }

    #[async_trait]
    impl LlmOracle for FakeOracle {
        async fn rewrite(
            &self,
            query_text: &str,
            _hints: &[String],
        ) -> Result<String, crate::error::OracleError> {
            Ok(query_text.to_string())
        }

        async fn needs_more_information(
            &self,
            _query_text: &str,
        ) -> Result<crate::oracle::InformationNeed, crate::error::OracleError> {
            Ok(crate::oracle::InformationNeed {
                needs_more_information: !self.skip_retrieval,
                reason: "test".to_string(),
            })
        }

        async fn choose_source(
            &self,
            _query_text: &str,
        ) -> Result<SourceKind, crate::error::OracleError> {
            Ok(self.source)
        }

        async fn answer(
            &self,
            _query_text: &str,
            _compiled_context: &CompiledContext,
        ) -> Result<String, crate::error::OracleError> {
            if self.empty_answers {
                Ok(String::new())
            } else {
                Ok("a grounded answer".to_string())
            }
        }

        async fn grade(
            &self,
            _query_text: &str,
            _compiled_context: &CompiledContext,
            _answer_text: &str,
        ) -> Result<RawGrade, crate::error::OracleError> {
            let idx = self.grade_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .grade_sequence
                .get(idx)
                .cloned()
                .unwrap_or_else(|| self.grade_sequence.last().unwrap().clone()))
        }
    }

    struct FakeBackend {
        kind: SourceKind,
        items: Vec<ContextItem>,
    }

    #[async_trait]
    impl RetrievalBackend for FakeBackend {
        fn source_kind(&self) -> SourceKind {
            self.kind
        }

        async fn retrieve(&self, _query_text: &str, _mode: RetrievalMode) -> RetrievalResult {
            RetrievalResult {
                source_kind: Some(self.kind),
                items: self.items.clone(),
                raw_metadata: Default::default(),
                confidence: Some(0.9),
            }
        }
    }

    fn engine_with(
        oracle: FakeOracle,
        items: Vec<ContextItem>,
    ) -> WorkflowEngine {
        let kind = oracle.source;
        let backends = BackendRegistry::new().register(Arc::new(FakeBackend { kind, items }));
        WorkflowEngine::new(Arc::new(oracle), backends, crate::session_store::SessionStore::shared())
    }

    fn high_score_item() -> ContextItem {
        ContextItem {
            text: "machine learning is a field of AI".to_string(),
            source_id: "doc-1".to_string(),
            score: 0.95,
            entities: None,
            mode: None,
        }
    }

    #[tokio::test]
    async fn s1_happy_path_terminates_at_n11() {
        let engine = engine_with(FakeOracle::happy_path(), vec![high_score_item()]);
        let response = engine
            .process_query("What is machine learning?", ConfigOverrides::default())
            .await
            .unwrap();
        assert!(response.confidence >= 0.7);
        assert!(!response.sources.is_empty());
        assert_eq!(response.metadata.query_rewrites, 1);
        assert_eq!(response.metadata.workflow_completed_at_node, 11);
    }

    #[tokio::test]
    async fn s2_refinement_loop_exhausts_to_fallback_or_error() {
        let engine = engine_with(FakeOracle::always_needs_retry(), vec![]);
        let result = engine
            .process_query("xyz nonsense", ConfigOverrides::default())
            .await;
        // Empty retrieval + bad grade every time: either a low-confidence
        // fallback (a candidate was graded, even if poorly) or exhaustion.
        match result {
            Ok(response) => assert!(response.metadata.workflow_completed_at_node == 12),
            Err(WorkflowError::Exhausted { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn s3_skip_retrieval_eventually_terminates_at_n12() {
        let engine = engine_with(FakeOracle::skip_retrieval_entirely(), vec![]);
        let result = engine
            .process_query("Say hello", ConfigOverrides::default())
            .await;
        assert!(matches!(result, Err(WorkflowError::Exhausted { .. })));
    }

    #[tokio::test]
    async fn bounded_work_respects_history_length_property() {
        let engine = engine_with(FakeOracle::always_needs_retry(), vec![]);
        let query_id = "bounded-work-check";
        let config = Config::default();
        let _ = engine
            .run(query_id, "xyz nonsense", &config, CancellationToken::new())
            .await;
        let state = engine.session_store.get(query_id).await.unwrap();
        let max_len = 9 * (config.workflow.max_retries + 1) + 1;
        assert!(state.history.len() as u32 <= max_len);
    }

    #[tokio::test]
    async fn every_history_edge_is_legal() {
        let engine = engine_with(FakeOracle::happy_path(), vec![high_score_item()]);
        let query_id = "legality-check";
        let config = Config::default();
        let _ = engine
            .run(query_id, "What is machine learning?", &config, CancellationToken::new())
            .await;
        let state = engine.session_store.get(query_id).await.unwrap();
        for transition in &state.history {
            assert!(Node::is_legal_edge(transition.from_node, transition.to_node));
        }
    }

    #[tokio::test]
    async fn retry_count_is_monotone_non_decreasing() {
        let engine = engine_with(FakeOracle::always_needs_retry(), vec![]);
        let query_id = "monotone-check";
        let config = Config::default();
        let _ = engine
            .run(query_id, "xyz nonsense", &config, CancellationToken::new())
            .await;
        let state = engine.session_store.get(query_id).await.unwrap();
        assert!(state.retry_count <= state.max_retries);
    }

    #[tokio::test]
    async fn cancellation_yields_no_final_response() {
        let engine = engine_with(FakeOracle::happy_path(), vec![high_score_item()]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = engine
            .process_query_with_cancellation(
                "What is machine learning?",
                ConfigOverrides::default(),
                cancel,
            )
            .await;
        assert!(matches!(result, Err(WorkflowError::Cancelled { .. })));
    }
}
