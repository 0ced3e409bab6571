//! Concrete adapters for the agentic RAG workflow engine: an `LlmOracle`
//! backed by a real completions endpoint, and `RetrievalBackend`
//! implementations for the knowledge store, web search, and tool/API
//! source kinds. The deterministic orchestration logic itself lives in
//! `rag-core`; this crate only wires it to the outside world.

pub mod backends;
pub mod config;
pub mod oracle_client;
pub mod prompts;

pub use backends::{KnowledgeStoreBackend, ToolApiBackend, WebSearchBackend};
pub use config::OracleEndpoint;
pub use oracle_client::RigOracle;
