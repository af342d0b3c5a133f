//! Lexical index: a single inverted index shared across all levels.

use std::collections::{HashMap, HashSet};

use crate::hierarchy::NodeId;

/// Lowercase ASCII tokens, split on whitespace; punctuation is kept as its
/// own single-character token.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else if ch.is_ascii_punctuation() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(ch.to_string());
        } else {
            current.extend(ch.to_lowercase());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Token → posting list of `(NodeId, term_frequency)`.
#[derive(Default)]
pub struct InvertedIndex {
    postings: HashMap<String, HashMap<NodeId, u32>>,
    tombstones: HashSet<NodeId>,
}

impl InvertedIndex {
    /// An empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `text` under `id`. Re-indexing the same doc accumulates term
    /// counts rather than replacing them, per spec.
    pub fn index(&mut self, id: NodeId, text: &str) {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for token in tokenize(text) {
            *counts.entry(token).or_insert(0) += 1;
        }
        for (token, count) in counts {
            let postings = self.postings.entry(token).or_default();
            *postings.entry(id).or_insert(0) += count;
        }
    }

    /// Soft-delete `id`; its postings remain but are filtered from results.
    pub fn tombstone(&mut self, id: NodeId) {
        self.tombstones.insert(id);
    }

    /// OR-semantics search: top-`k` docs by accumulated term count across
    /// `tokens` (already-lowercased query tokens or raw words — this
    /// lowercases again for safety).
    #[must_use]
    pub fn search_any(&self, tokens: &[String], k: usize) -> Vec<(NodeId, u32)> {
        let mut scores: HashMap<NodeId, u32> = HashMap::new();
        for token in tokens {
            let lower = token.to_lowercase();
            if let Some(postings) = self.postings.get(&lower) {
                for (&id, &tf) in postings {
                    if self.tombstones.contains(&id) {
                        continue;
                    }
                    *scores.entry(id).or_insert(0) += tf;
                }
            }
        }
        let mut results: Vec<(NodeId, u32)> = scores.into_iter().collect();
        results.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.0.cmp(&b.0.0)));
        results.truncate(k);
        results
    }
}
