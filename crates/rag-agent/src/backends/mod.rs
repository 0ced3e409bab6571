//! Concrete `RetrievalBackend` implementations.

mod knowledge_store;
mod tool_api;
mod web;

pub use knowledge_store::KnowledgeStoreBackend;
pub use tool_api::ToolApiBackend;
pub use web::WebSearchBackend;
