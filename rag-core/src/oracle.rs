//! The LLM Oracle Adapter seam (C1).
//!
//! `rag-core` only declares the trait; the concrete implementation backed by
//! a real LLM client lives in the `rag-agent` crate. This keeps the
//! deterministic workflow logic free of any LLM SDK dependency.

use async_trait::async_trait;

use crate::context_compiler::CompiledContext;
use crate::error::OracleError;
use crate::grader::RawGrade;
use crate::retrieval::SourceKind;

/// Binary decision on whether more information is required, with a short
/// natural-language justification.
#[derive(Debug, Clone, PartialEq)]
pub struct InformationNeed {
    pub needs_more_information: bool,
    pub reason: String,
}

/// The LLM, abstracted as a function mapping typed prompts to typed,
/// strictly-parsed replies. Every call returns `OracleError::Parse` if the
/// reply cannot be parsed into the declared structure, or
/// `OracleError::Transport` after internal retries are exhausted.
#[async_trait]
pub trait LlmOracle: Send + Sync {
    /// Canonicalize abbreviations, clarify ambiguity, optionally incorporate
    /// `hints` accumulated from prior loopbacks.
    async fn rewrite(&self, query_text: &str, hints: &[String]) -> Result<String, OracleError>;

    /// Decide whether the query needs retrieval before it can be answered.
    async fn needs_more_information(&self, query_text: &str) -> Result<InformationNeed, OracleError>;

    /// Choose exactly one retrieval source kind for the query.
    async fn choose_source(&self, query_text: &str) -> Result<SourceKind, OracleError>;

    /// Generate a response grounded in the compiled context.
    async fn answer(
        &self,
        query_text: &str,
        compiled_context: &CompiledContext,
    ) -> Result<String, OracleError>;

    /// Score a generated answer against the query and the context used to
    /// produce it, returning the raw five-axis rubric. `rag-core`'s `Grader`
    /// (C4) wraps this call and deterministically derives
    /// `needs_improvement` / `recommendation` from the raw scores — the
    /// oracle itself never decides those.
    async fn grade(
        &self,
        query_text: &str,
        compiled_context: &CompiledContext,
        answer_text: &str,
    ) -> Result<RawGrade, OracleError>;
}
