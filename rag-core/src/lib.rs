//! Deterministic agentic RAG workflow engine.
//!
//! This crate contains the orchestration logic only: the twelve-node state
//! machine, context compilation, grading derivation, and session snapshot
//! store. It declares the `LlmOracle` and `RetrievalBackend` seams as traits
//! but depends on no concrete LLM SDK or HTTP client — those adapters live
//! in the sibling `rag-agent` crate.

#![allow(dead_code)]

pub mod config;
pub mod context_compiler;
pub mod error;
pub mod grader;
pub mod oracle;
pub mod query;
pub mod retrieval;
pub mod session_store;
pub mod workflow;

pub use config::{Config, ConfigOverrides, OracleConfig, RetrievalConfig, WorkflowConfig};
pub use context_compiler::{CompileBudget, CompiledContext};
pub use error::{BackendError, OracleError, RetryCategory, WorkflowError};
pub use grader::{GradingResult, Grader, RawGrade, Recommendation};
pub use oracle::{InformationNeed, LlmOracle};
pub use query::Query;
pub use retrieval::{
    BackendRegistry, ContextItem, KnowledgeStoreMode, RetrievalBackend, RetrievalMode,
    RetrievalResult, SourceKind,
};
pub use session_store::{QuerySubscription, SessionStore, SharedSessionStore};
pub use workflow::{
    CandidateAnswer, FinalResponse, FinalResponseMetadata, Node, NodeTransition, TerminalReason,
    WorkflowEngine, WorkflowState,
};
