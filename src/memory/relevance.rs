//! Relevance scoring for memory recall and document search
//!
//! Term overlap: number of distinct lower-cased, whitespace-split query
//! terms that occur in the candidate text. An embedding ranker can replace
//! it by implementing [`RelevanceScorer`].

use crate::memory::types::MemoryEntry;
use std::collections::HashSet;

/// Scores a memory entry against a query; higher is more relevant
pub trait RelevanceScorer: Send + Sync {
    fn score(&self, query: &str, entry: &MemoryEntry) -> f64;
}

/// Counts query terms present in the entry's input+output text
#[derive(Debug, Clone, Copy, Default)]
pub struct TermOverlapScorer;

impl RelevanceScorer for TermOverlapScorer {
    fn score(&self, query: &str, entry: &MemoryEntry) -> f64 {
        term_overlap(query, &entry.searchable_text()) as f64
    }
}

/// Distinct query terms contained in `text` (case-insensitive)
pub fn term_overlap(query: &str, text: &str) -> usize {
    let haystack = text.to_lowercase();
    let terms: HashSet<String> = query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .collect();

    terms
        .iter()
        .filter(|term| haystack.contains(term.as_str()))
        .count()
}
