//! The user's query as it evolves across workflow iterations.

use serde::{Deserialize, Serialize};

/// The user's immutable original text plus an evolving rewritten form.
///
/// `current_text` is mutable only by node N2 (rewrite). `enhancement_hints`
/// is appended only by node N12 during loopback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Query {
    pub original_text: String,
    pub current_text: String,
    pub enhancement_hints: Vec<String>,
}

impl Query {
    pub fn new(original_text: impl Into<String>) -> Self {
        let text = original_text.into();
        Self {
            current_text: text.clone(),
            original_text: text,
            enhancement_hints: Vec::new(),
        }
    }

    /// N2: replace the current text with a rewritten form.
    pub fn set_rewritten(&mut self, rewritten: String) {
        self.current_text = rewritten;
    }

    /// N12 loopback: append an enhancement hint for the next iteration.
    pub fn push_hint(&mut self, hint: String) {
        self.enhancement_hints.push(hint);
    }
}
