//! Endpoint configuration for the concrete adapters: the OpenAI-compatible
//! completions endpoint behind `RigOracle`, and the HTTP endpoints behind
//! the knowledge-store and web-search backends.
//!
//! Precedence (highest to lowest):
//!
//! 1. Environment variable
//! 2. Built-in default

use std::env;

const ENV_ORACLE_BASE_URL: &str = "ORACLE_BASE_URL";
const ENV_ORACLE_API_KEY: &str = "ORACLE_API_KEY";
const DEFAULT_ORACLE_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection details for the completions endpoint `RigOracle` talks to.
/// Model, temperature, and max_tokens live in `rag_core::config::OracleConfig`
/// — this struct only carries the transport-level settings a `rig` client
/// needs to be built.
#[derive(Debug, Clone)]
pub struct OracleEndpoint {
    pub base_url: String,
    pub api_key: String,
}

impl Default for OracleEndpoint {
    fn default() -> Self {
        Self {
            base_url: env::var(ENV_ORACLE_BASE_URL)
                .unwrap_or_else(|_| DEFAULT_ORACLE_BASE_URL.to_string()),
            api_key: env::var(ENV_ORACLE_API_KEY).unwrap_or_else(|_| "not-needed".to_string()),
        }
    }
}
