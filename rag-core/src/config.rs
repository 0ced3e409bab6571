//! Workflow-level configuration, overridable by environment.
//!
//! Precedence (highest to lowest):
//!
//! 1. Explicit `ConfigOverrides` passed to `process_query`
//! 2. Environment variable
//! 3. Built-in default

use std::env;

use serde::{Deserialize, Serialize};

const ENV_MODEL: &str = "ORACLE_MODEL";
const ENV_TEMPERATURE: &str = "ORACLE_TEMPERATURE";
const ENV_MAX_TOKENS: &str = "ORACLE_MAX_TOKENS";
const ENV_MAX_RETRIES: &str = "WORKFLOW_MAX_RETRIES";
const ENV_ACCEPTANCE_THRESHOLD: &str = "WORKFLOW_ACCEPTANCE_THRESHOLD";
const ENV_WALL_CLOCK_TIMEOUT_SECONDS: &str = "WORKFLOW_WALL_CLOCK_TIMEOUT_SECONDS";
const ENV_KNOWLEDGE_STORE_URL: &str = "RETRIEVAL_KNOWLEDGE_STORE_URL";
const ENV_KNOWLEDGE_STORE_QUERY_PATH: &str = "RETRIEVAL_KNOWLEDGE_STORE_QUERY_PATH";
const ENV_WEB_API_KEY: &str = "RETRIEVAL_WEB_API_KEY";
const ENV_BACKEND_TIMEOUT_SECONDS: &str = "RETRIEVAL_BACKEND_TIMEOUT_SECONDS";

fn from_env<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Oracle (LLM) configuration recognized by the adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OracleConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: env::var(ENV_MODEL).unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            temperature: from_env(ENV_TEMPERATURE, 0.3),
            max_tokens: from_env(ENV_MAX_TOKENS, 500),
        }
    }
}

/// Retrieval backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    pub knowledge_store_url: Option<String>,
    pub knowledge_store_query_path: Option<String>,
    pub web_api_key: Option<String>,
    pub backend_timeout_seconds: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            knowledge_store_url: env::var(ENV_KNOWLEDGE_STORE_URL).ok(),
            knowledge_store_query_path: env::var(ENV_KNOWLEDGE_STORE_QUERY_PATH).ok(),
            web_api_key: env::var(ENV_WEB_API_KEY).ok(),
            backend_timeout_seconds: from_env(ENV_BACKEND_TIMEOUT_SECONDS, 30),
        }
    }
}

/// Workflow engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkflowConfig {
    pub max_retries: u32,
    pub acceptance_threshold: f64,
    pub wall_clock_timeout_seconds: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_retries: from_env(ENV_MAX_RETRIES, 2),
            acceptance_threshold: from_env(ENV_ACCEPTANCE_THRESHOLD, 0.7),
            wall_clock_timeout_seconds: from_env(ENV_WALL_CLOCK_TIMEOUT_SECONDS, 300),
        }
    }
}

/// Full orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    pub oracle: OracleConfig,
    pub retrieval: RetrievalConfig,
    pub workflow: WorkflowConfig,
}

/// Partial overrides accepted by `process_query`, merged over the
/// environment-derived `Config::default()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub max_retries: Option<u32>,
    pub acceptance_threshold: Option<f64>,
    pub wall_clock_timeout_seconds: Option<u64>,
}

impl Config {
    /// Load defaults (environment-backed) and apply explicit overrides.
    pub fn with_overrides(overrides: ConfigOverrides) -> Self {
        let mut config = Config::default();
        if let Some(v) = overrides.max_retries {
            config.workflow.max_retries = v;
        }
        if let Some(v) = overrides.acceptance_threshold {
            config.workflow.acceptance_threshold = v;
        }
        if let Some(v) = overrides.wall_clock_timeout_seconds {
            config.workflow.wall_clock_timeout_seconds = v;
        }
        config
    }

    /// Validate required configuration, e.g. a knowledge-store URL when that
    /// backend would otherwise be the only usable one.
    pub fn validate(&self) -> Result<(), crate::error::WorkflowError> {
        if self.retrieval.knowledge_store_url.is_none() && self.retrieval.web_api_key.is_none() {
            return Err(crate::error::WorkflowError::Configuration(
                "no retrieval backend configured: set RETRIEVAL_KNOWLEDGE_STORE_URL or RETRIEVAL_WEB_API_KEY"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
