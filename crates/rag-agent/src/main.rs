use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use rag_core::{BackendRegistry, Config, ConfigOverrides, WorkflowEngine};
use tracing::info;

use rag_agent::{KnowledgeStoreBackend, OracleEndpoint, RigOracle, WebSearchBackend};

/// Run one query through the agentic RAG workflow engine.
#[derive(Debug, Parser)]
struct Cli {
    /// The user query to answer.
    query: String,

    /// Override the maximum number of retry loops.
    #[arg(long)]
    max_retries: Option<u32>,

    /// Override the grading acceptance threshold.
    #[arg(long)]
    acceptance_threshold: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    info!(
        model = %config.oracle.model,
        max_retries = config.workflow.max_retries,
        acceptance_threshold = config.workflow.acceptance_threshold,
        "agentic RAG workflow starting"
    );

    let oracle = RigOracle::new(OracleEndpoint::default(), config.oracle.clone())?;

    let mut backends = BackendRegistry::new();
    if let Some(url) = &config.retrieval.knowledge_store_url {
        let query_path = config
            .retrieval
            .knowledge_store_query_path
            .clone()
            .unwrap_or_else(|| "query".to_string());
        backends = backends.register(Arc::new(KnowledgeStoreBackend::new(
            url.clone(),
            query_path,
            config.retrieval.backend_timeout_seconds,
        )));
    }
    if let Some(api_key) = &config.retrieval.web_api_key {
        backends = backends.register(Arc::new(WebSearchBackend::new(
            "https://api.search.example.com/v1/search".to_string(),
            api_key.clone(),
            config.retrieval.backend_timeout_seconds,
        )));
    }

    let session_store = rag_core::SessionStore::shared();
    let engine = WorkflowEngine::new(Arc::new(oracle), backends, session_store);

    let overrides = ConfigOverrides {
        max_retries: cli.max_retries,
        acceptance_threshold: cli.acceptance_threshold,
        wall_clock_timeout_seconds: None,
    };

    let response = engine.process_query(&cli.query, overrides).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
