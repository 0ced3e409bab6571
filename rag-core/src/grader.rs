//! Quality Grader (C4).
//!
//! Wraps `LlmOracle::grade` and enforces the rubric contract deterministically:
//! the oracle supplies raw axis scores, and this module derives
//! `needs_improvement` and `recommendation` by rule, keeping the acceptance
//! decision independent of whatever the model itself claims.

use serde::{Deserialize, Serialize};

use crate::context_compiler::CompiledContext;
use crate::error::OracleError;
use crate::oracle::LlmOracle;
use crate::retrieval::SourceKind;

/// Raw five-axis rubric produced directly by the oracle, before the
/// deterministic `needs_improvement` / `recommendation` derivation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawGrade {
    pub relevancy: f64,
    pub faithfulness: f64,
    pub context_quality: f64,
    pub coherence: f64,
    pub improvement_reason: String,
}

impl RawGrade {
    fn min_axis(&self) -> f64 {
        self.relevancy
            .min(self.faithfulness)
            .min(self.context_quality)
            .min(self.coherence)
    }

    /// Aggregate `overall`: the mean of the four axes, clamped so it never
    /// exceeds `min(axes) + 0.1`.
    fn overall(&self) -> f64 {
        let mean =
            (self.relevancy + self.faithfulness + self.context_quality + self.coherence) / 4.0;
        mean.min(self.min_axis() + 0.1)
    }

    /// Which axis is lowest, used to derive `recommendation`.
    fn lowest_axis(&self) -> GradeAxis {
        let mut lowest = (GradeAxis::Relevancy, self.relevancy);
        for (axis, value) in [
            (GradeAxis::Faithfulness, self.faithfulness),
            (GradeAxis::ContextQuality, self.context_quality),
            (GradeAxis::Coherence, self.coherence),
        ] {
            if value < lowest.1 {
                lowest = (axis, value);
            }
        }
        lowest.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GradeAxis {
    Relevancy,
    Faithfulness,
    ContextQuality,
    Coherence,
}

/// C4's output: the full rubric plus the derived acceptance decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradingResult {
    pub relevancy: f64,
    pub faithfulness: f64,
    pub context_quality: f64,
    pub coherence: f64,
    pub overall: f64,
    pub needs_improvement: bool,
    pub improvement_reason: String,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    RetryRetrieval,
    WebSearch,
    Accept,
    ClarifyQuery,
}

/// Grades an answer, wrapping the oracle call with the deterministic
/// derivation rules below.
pub struct Grader {
    acceptance_threshold: f64,
}

impl Grader {
    pub fn new(acceptance_threshold: f64) -> Self {
        Self {
            acceptance_threshold,
        }
    }

    pub async fn grade(
        &self,
        oracle: &dyn LlmOracle,
        query_text: &str,
        compiled_context: &CompiledContext,
        answer_text: &str,
        last_retrieval_source: Option<SourceKind>,
    ) -> Result<GradingResult, OracleError> {
        let raw = oracle.grade(query_text, compiled_context, answer_text).await?;
        Ok(self.derive(raw, last_retrieval_source))
    }

    /// Pure derivation, split out so it can be unit-tested without a
    /// network-backed oracle.
    pub fn derive(&self, raw: RawGrade, last_retrieval_source: Option<SourceKind>) -> GradingResult {
        let overall = raw.overall();
        let needs_improvement = overall < self.acceptance_threshold;

        let recommendation = if !needs_improvement {
            Recommendation::Accept
        } else {
            match raw.lowest_axis() {
                GradeAxis::ContextQuality => {
                    if last_retrieval_source == Some(SourceKind::KnowledgeStore) {
                        Recommendation::RetryRetrieval
                    } else {
                        Recommendation::WebSearch
                    }
                }
                GradeAxis::Relevancy => Recommendation::ClarifyQuery,
                GradeAxis::Faithfulness => Recommendation::RetryRetrieval,
                GradeAxis::Coherence => Recommendation::RetryRetrieval,
            }
        };

        GradingResult {
            relevancy: raw.relevancy,
            faithfulness: raw.faithfulness,
            context_quality: raw.context_quality,
            coherence: raw.coherence,
            overall,
            needs_improvement,
            improvement_reason: raw.improvement_reason,
            recommendation,
        }
    }
}
