//! Context Compiler (C3).
//!
//! Pure, I/O-free merging of heterogeneous `RetrievalResult`s into a single
//! ranked, attributed `CompiledContext`. Truncates by item count and
//! character count rather than token count, matching the budget units
//! exposed to callers.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::retrieval::{ContextItem, RetrievalResult, SourceKind};

pub const DEFAULT_MAX_CONTEXT_ITEMS: usize = 12;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 8_000;

/// C3's output: a ranked, deduplicated, budgeted bundle of evidence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompiledContext {
    pub ordered_items: Vec<ContextItem>,
    /// `(source_kind, source_id)` keys retained after dedup, for diagnostics.
    #[serde(skip)]
    pub dedup_key_index: HashSet<(SourceKindTag, String)>,
    pub source_mix: HashMap<String, usize>,
}

/// `SourceKind` is not `Hash`+`Eq`-friendly for a public dedup key by itself
/// once combined with a String tuple member in some serde contexts; this
/// thin wrapper keeps the index internal-only and side-steps that.
pub type SourceKindTag = SourceKind;

/// Budgeting knobs for `compile`.
#[derive(Debug, Clone, Copy)]
pub struct CompileBudget {
    pub max_context_items: usize,
    pub max_context_chars: usize,
}

impl Default for CompileBudget {
    fn default() -> Self {
        Self {
            max_context_items: DEFAULT_MAX_CONTEXT_ITEMS,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

/// Merge one or more `RetrievalResult`s into a `CompiledContext`.
///
/// 1. Dedup by `(source_kind, source_id)`, keeping the higher score on a tie.
/// 2. Rank by descending score, then `SourceKind::rank_priority`, then
///    original insertion order (stable sort preserves this automatically).
/// 3. Truncate to whichever of `max_context_items` / `max_context_chars`
///    binds first, preserving the ranked prefix.
///
/// Every retained item keeps its original `source_id` — the compiler never
/// fuses texts in a way that would lose citability.
pub fn compile(results: &[RetrievalResult], budget: CompileBudget) -> CompiledContext {
    // Stage 1: dedup, keeping first-seen insertion order and the higher score.
    let mut order: Vec<(SourceKind, String)> = Vec::new();
    let mut by_key: HashMap<(SourceKind, String), ContextItem> = HashMap::new();

    for result in results {
        let Some(source_kind) = result.source_kind else {
            continue;
        };
        for item in &result.items {
            let key = (source_kind, item.source_id.clone());
            match by_key.get_mut(&key) {
                Some(existing) => {
                    if item.score > existing.score {
                        *existing = item.clone();
                    }
                }
                None => {
                    order.push(key.clone());
                    by_key.insert(key, item.clone());
                }
            }
        }
    }

    // Stage 2: rank. `order` already encodes insertion order for stable ties.
    let mut ranked: Vec<(SourceKind, ContextItem)> = order
        .into_iter()
        .map(|key @ (source_kind, _)| (source_kind, by_key.remove(&key).expect("just inserted")))
        .collect();

    ranked.sort_by(|(kind_a, item_a), (kind_b, item_b)| {
        item_b
            .score
            .partial_cmp(&item_a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| kind_a.rank_priority().cmp(&kind_b.rank_priority()))
    });

    // Stage 3: budget. Stop at whichever limit binds first.
    let mut ordered_items = Vec::new();
    let mut dedup_key_index = HashSet::new();
    let mut source_mix: HashMap<String, usize> = HashMap::new();
    let mut total_chars = 0usize;

    for (source_kind, item) in ranked {
        if ordered_items.len() >= budget.max_context_items {
            break;
        }
        let item_chars = item.text.chars().count();
        if total_chars + item_chars > budget.max_context_chars && !ordered_items.is_empty() {
            break;
        }
        total_chars += item_chars;
        dedup_key_index.insert((source_kind, item.source_id.clone()));
        *source_mix.entry(source_kind.to_string()).or_insert(0) += 1;
        ordered_items.push(item);
    }

    CompiledContext {
        ordered_items,
        dedup_key_index,
        source_mix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source_id: &str, score: f64) -> ContextItem {
        ContextItem {
            text: format!("text for {source_id}"),
            source_id: source_id.to_string(),
            score,
            entities: None,
            mode: None,
        }
    }

    fn result(kind: SourceKind, items: Vec<ContextItem>) -> RetrievalResult {
        RetrievalResult {
            source_kind: Some(kind),
            items,
            raw_metadata: HashMap::new(),
            confidence: None,
        }
    }

    #[test]
    fn dedups_by_source_kind_and_id_keeping_higher_score() {
        let results = vec![result(
            SourceKind::KnowledgeStore,
            vec![item("doc-1", 0.5), item("doc-1", 0.9)],
        )];
        let compiled = compile(&results, CompileBudget::default());
        assert_eq!(compiled.ordered_items.len(), 1);
        assert_eq!(compiled.ordered_items[0].score, 0.9);
    }

    #[test]
    fn ranks_by_score_then_source_priority() {
        let results = vec![
            result(SourceKind::Web, vec![item("w-1", 0.8)]),
            result(SourceKind::KnowledgeStore, vec![item("k-1", 0.8)]),
            result(SourceKind::ToolApi, vec![item("t-1", 0.8)]),
        ];
        let compiled = compile(&results, CompileBudget::default());
        let ids: Vec<&str> = compiled
            .ordered_items
            .iter()
            .map(|i| i.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["k-1", "t-1", "w-1"]);
    }

    #[test]
    fn truncates_to_max_context_items() {
        let items: Vec<ContextItem> = (0..20).map(|i| item(&format!("d-{i}"), 1.0)).collect();
        let results = vec![result(SourceKind::KnowledgeStore, items)];
        let budget = CompileBudget {
            max_context_items: 5,
            max_context_chars: usize::MAX,
        };
        let compiled = compile(&results, budget);
        assert_eq!(compiled.ordered_items.len(), 5);
    }

    #[test]
    fn truncates_to_max_context_chars_but_always_keeps_first_item() {
        let long_item = ContextItem {
            text: "x".repeat(100),
            source_id: "big".to_string(),
            score: 1.0,
            entities: None,
            mode: None,
        };
        let results = vec![result(SourceKind::KnowledgeStore, vec![long_item])];
        let budget = CompileBudget {
            max_context_items: 10,
            max_context_chars: 10,
        };
        let compiled = compile(&results, budget);
        assert_eq!(compiled.ordered_items.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_context() {
        let compiled = compile(&[], CompileBudget::default());
        assert!(compiled.ordered_items.is_empty());
    }

    #[test]
    fn insertion_order_breaks_ties() {
        let results = vec![result(
            SourceKind::KnowledgeStore,
            vec![item("first", 0.5), item("second", 0.5)],
        )];
        let compiled = compile(&results, CompileBudget::default());
        let ids: Vec<&str> = compiled
            .ordered_items
            .iter()
            .map(|i| i.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["first", "second"]);
    }
}
