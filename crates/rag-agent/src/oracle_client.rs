//! `RigOracle`: the concrete `LlmOracle` implementation backed by an
//! OpenAI-compatible completions endpoint via `rig`.
//!
//! Every operation builds a single-purpose agent (fixed preamble,
//! temperature, max tokens) and issues one `.prompt()` call, then parses the
//! reply into the declared structure. Transport failures are retried inside
//! this adapter with exponential backoff; parse failures are not retried
//! here — the Workflow Engine decides what to do with an `OracleError`.

use std::time::Duration;

use async_trait::async_trait;
use rag_core::{
    CompiledContext, InformationNeed, LlmOracle, OracleConfig, OracleError, RawGrade, SourceKind,
};
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use serde::Deserialize;
use tracing::warn;

use crate::config::OracleEndpoint;
use crate::prompts;

/// Maximum internal retry attempts for transient transport errors per call.
const MAX_TRANSPORT_RETRIES: u32 = 3;

pub struct RigOracle {
    client: openai::CompletionsClient,
    config: OracleConfig,
}

impl RigOracle {
    pub fn new(endpoint: OracleEndpoint, config: OracleConfig) -> Result<Self, OracleError> {
        let client = openai::CompletionsClient::builder()
            .api_key(&endpoint.api_key)
            .base_url(&endpoint.base_url)
            .build()
            .map_err(|e| OracleError::Transport {
                operation: "client_init".to_string(),
                attempts: 0,
                reason: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    async fn complete(&self, operation: &str, preamble: &str, prompt: &str) -> Result<String, OracleError> {
        let agent = self
            .client
            .agent(&self.config.model)
            .preamble(preamble)
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens as u64)
            .build();

        let mut last_err = None;
        for attempt in 0..=MAX_TRANSPORT_RETRIES {
            match agent.prompt(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let message = e.to_string();
                    let lower = message.to_ascii_lowercase();
                    let transient = lower.contains("502")
                        || lower.contains("503")
                        || lower.contains("429")
                        || lower.contains("connection")
                        || lower.contains("timed out")
                        || lower.contains("timeout");
                    if !transient || attempt == MAX_TRANSPORT_RETRIES {
                        return Err(OracleError::Transport {
                            operation: operation.to_string(),
                            attempts: attempt + 1,
                            reason: message,
                        });
                    }
                    let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                    warn!(operation, attempt = attempt + 1, backoff_secs = backoff.as_secs(), error = %message, "oracle call failed, retrying");
                    last_err = Some(message);
                    tokio::time::sleep(backoff).await;
                }
            }
        }
        Err(OracleError::Transport {
            operation: operation.to_string(),
            attempts: MAX_TRANSPORT_RETRIES + 1,
            reason: last_err.unwrap_or_else(|| "unknown transport failure".to_string()),
        })
    }

    fn parse_json<T: for<'de> Deserialize<'de>>(operation: &str, raw: &str) -> Result<T, OracleError> {
        let trimmed = raw.trim().trim_start_matches("```json").trim_start_matches("```").trim_end_matches("```").trim();
        serde_json::from_str(trimmed).map_err(|e| OracleError::Parse {
            operation: operation.to_string(),
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct NeedsInfoReply {
    needs_more_information: bool,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct GradeReply {
    relevancy: f64,
    faithfulness: f64,
    context_quality: f64,
    coherence: f64,
    improvement_reason: String,
}

#[async_trait]
impl LlmOracle for RigOracle {
    async fn rewrite(&self, query_text: &str, hints: &[String]) -> Result<String, OracleError> {
        let prompt = if hints.is_empty() {
            query_text.to_string()
        } else {
            format!(
                "{query_text}\n\nPrior attempt feedback to incorporate:\n{}",
                hints.join("\n")
            )
        };
        let reply = self.complete("rewrite", prompts::REWRITE_PREAMBLE, &prompt).await?;
        Ok(reply.trim().to_string())
    }

    async fn needs_more_information(&self, query_text: &str) -> Result<InformationNeed, OracleError> {
        let reply = self
            .complete("needs_more_information", prompts::NEEDS_INFO_PREAMBLE, query_text)
            .await?;
        let parsed: NeedsInfoReply = Self::parse_json("needs_more_information", &reply)?;
        Ok(InformationNeed {
            needs_more_information: parsed.needs_more_information,
            reason: parsed.reason,
        })
    }

    async fn choose_source(&self, query_text: &str) -> Result<SourceKind, OracleError> {
        let reply = self
            .complete("choose_source", prompts::CHOOSE_SOURCE_PREAMBLE, query_text)
            .await?;
        SourceKind::parse_tag(reply.trim()).ok_or_else(|| OracleError::Parse {
            operation: "choose_source".to_string(),
            reason: format!("unrecognized source tag: {reply:?}"),
        })
    }

    async fn answer(
        &self,
        query_text: &str,
        compiled_context: &CompiledContext,
    ) -> Result<String, OracleError> {
        let mut context_block = String::new();
        for item in &compiled_context.ordered_items {
            context_block.push_str(&format!("[{}] {}\n\n", item.source_id, item.text));
        }
        let prompt = format!("Context:\n{context_block}\nQuestion: {query_text}");
        self.complete("answer", prompts::ANSWER_PREAMBLE, &prompt).await
    }

    async fn grade(
        &self,
        query_text: &str,
        compiled_context: &CompiledContext,
        answer_text: &str,
    ) -> Result<RawGrade, OracleError> {
        let mut context_block = String::new();
        for item in &compiled_context.ordered_items {
            context_block.push_str(&format!("[{}] {}\n\n", item.source_id, item.text));
        }
        let prompt =
            format!("Query: {query_text}\n\nContext:\n{context_block}\nAnswer:\n{answer_text}");
        let reply = self.complete("grade", prompts::GRADE_PREAMBLE, &prompt).await?;
        let parsed: GradeReply = Self::parse_json("grade", &reply)?;
        Ok(RawGrade {
            relevancy: parsed.relevancy,
            faithfulness: parsed.faithfulness,
            context_quality: parsed.context_quality,
            coherence: parsed.coherence,
            improvement_reason: parsed.improvement_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Probe {
        ok: bool,
    }

    #[test]
    fn parse_json_accepts_plain_json() {
        let parsed: Probe = RigOracle::parse_json("probe", r#"{"ok": true}"#).unwrap();
        assert_eq!(parsed, Probe { ok: true });
    }

    #[test]
    fn parse_json_strips_markdown_code_fences() {
        let raw = "```json\n{\"ok\": true}\n```";
        let parsed: Probe = RigOracle::parse_json("probe", raw).unwrap();
        assert_eq!(parsed, Probe { ok: true });
    }

    #[test]
    fn parse_json_reports_operation_on_failure() {
        let err = RigOracle::parse_json::<Probe>("probe", "not json").unwrap_err();
        match err {
            OracleError::Parse { operation, .. } => assert_eq!(operation, "probe"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn source_kind_parsing_rejects_unknown_tags() {
        assert_eq!(SourceKind::parse_tag("carrier_pigeon"), None);
    }
}
