//! Error taxonomy for the orchestrator's component boundaries.
//!
//! Each component surfaces its own error enum; the Workflow Engine decides
//! which of these are recoverable locally (conservative default applied,
//! never surfaced) versus which bubble up to `process_query` callers.

use thiserror::Error;

/// Coarse classification shared by the error enums below, used by callers
/// that want to decide retry policy without string-matching on a `Display`
/// impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    /// Network/IO failure — safe to retry with backoff.
    Transient,
    /// The remote side returned output that failed structural parsing.
    ParseFailure,
    /// The operation cannot succeed by retrying (bad config, policy, etc).
    Terminal,
}

impl RetryCategory {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::Transient | Self::ParseFailure)
    }
}

/// Errors raised by an `LlmOracle` implementation.
#[derive(Debug, Error, Clone)]
pub enum OracleError {
    /// The model's reply could not be parsed into the declared structure.
    /// Not retried inside the adapter — the Workflow Engine decides.
    #[error("failed to parse oracle reply for {operation}: {reason}")]
    Parse { operation: String, reason: String },

    /// Network/IO failure. The adapter retries internally with exponential
    /// backoff up to a small bounded number of attempts before surfacing this.
    #[error("oracle transport failure for {operation} after {attempts} attempts: {reason}")]
    Transport {
        operation: String,
        attempts: u32,
        reason: String,
    },
}

impl OracleError {
    pub fn operation(&self) -> &str {
        match self {
            Self::Parse { operation, .. } => operation,
            Self::Transport { operation, .. } => operation,
        }
    }

    /// Parse failures are not retried by C1 itself (the Workflow Engine
    /// applies a conservative default instead); transport failures are
    /// already retried internally before this variant is ever constructed.
    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::Parse { .. } => RetryCategory::ParseFailure,
            Self::Transport { .. } => RetryCategory::Transient,
        }
    }
}

/// Errors raised by a `RetrievalBackend` implementation.
///
/// Backends never raise these past their own boundary — `retrieve`
/// always returns a (possibly empty) `RetrievalResult` with the error kind
/// recorded in `raw_metadata`. The enum still exists as a typed vocabulary
/// for that metadata and for backend-internal plumbing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend {source_kind} timed out after {timeout_secs}s")]
    Timeout {
        source_kind: String,
        timeout_secs: u64,
    },

    #[error("backend {source_kind} unavailable: {reason}")]
    Unavailable { source_kind: String, reason: String },

    #[error("backend {source_kind} protocol error: {reason}")]
    Protocol { source_kind: String, reason: String },
}

impl BackendError {
    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::Timeout { .. } => RetryCategory::Transient,
            Self::Unavailable { .. } => RetryCategory::Transient,
            Self::Protocol { .. } => RetryCategory::Terminal,
        }
    }
}

/// Errors surfaced to callers of `process_query`.
#[derive(Debug, Error, Clone)]
pub enum WorkflowError {
    /// Retries exhausted without ever producing an acceptable answer AND no
    /// best-candidate exists (every iteration produced an empty or
    /// ungradable answer).
    #[error("workflow exhausted without a usable candidate: {last_failure_cause}")]
    Exhausted { last_failure_cause: String },

    /// Cooperative cancellation or wall-clock timeout.
    #[error("workflow cancelled: {reason}")]
    Cancelled { reason: String },

    /// Missing required configuration (e.g. knowledge-store URL when that
    /// backend is the only one available).
    #[error("configuration error: {0}")]
    Configuration(String),
}
