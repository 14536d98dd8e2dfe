//! Core data types for per-agent memory

use crate::memory::relevance::RelevanceScorer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// Default short-term capacity per agent
pub const SHORT_TERM_CAPACITY: usize = 10;

/// One remembered (input, output) exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryEntry {
    pub id: String,
    pub input: String,
    pub output: String,
    pub timestamp: DateTime<Utc>,
    /// Store-wide insertion order; breaks timestamp ties
    pub sequence: u64,
    pub metadata: HashMap<String, Value>,
}

impl MemoryEntry {
    pub fn new(
        input: impl Into<String>,
        output: impl Into<String>,
        metadata: HashMap<String, Value>,
        sequence: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            input: input.into(),
            output: output.into(),
            timestamp: Utc::now(),
            sequence,
            metadata,
        }
    }

    /// Text searched by relevance scorers
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.input, self.output)
    }

    /// Recency key, newest compares greatest
    pub fn recency(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.sequence)
    }
}

/// Entry counts for one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryStats {
    pub short_term: usize,
    pub long_term: usize,
}

impl MemoryStats {
    pub fn total(&self) -> usize {
        self.short_term + self.long_term
    }
}

/// Bounded short-term list (newest first) plus unbounded long-term list
#[derive(Debug, Clone)]
pub struct AgentMemory {
    short_term: VecDeque<MemoryEntry>,
    long_term: Vec<MemoryEntry>,
    capacity: usize,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::with_capacity(SHORT_TERM_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            short_term: VecDeque::with_capacity(capacity + 1),
            long_term: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Insert at the front; the oldest short-term entry moves to long-term on overflow.
    /// Returns the id of the moved entry.
    pub fn push(&mut self, entry: MemoryEntry) -> Option<String> {
        self.short_term.push_front(entry);

        if self.short_term.len() > self.capacity {
            if let Some(oldest) = self.short_term.pop_back() {
                let id = oldest.id.clone();
                self.long_term.push(oldest);
                return Some(id);
            }
        }
        None
    }

    /// Short-term entries, newest first
    pub fn short_term(&self) -> &VecDeque<MemoryEntry> {
        &self.short_term
    }

    pub fn long_term(&self) -> &[MemoryEntry] {
        &self.long_term
    }

    pub fn clear_short_term(&mut self) {
        self.short_term.clear();
    }

    /// Move every short-term entry to long-term
    pub fn consolidate(&mut self) {
        // oldest first so long-term stays in insertion order
        while let Some(entry) = self.short_term.pop_back() {
            self.long_term.push(entry);
        }
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            short_term: self.short_term.len(),
            long_term: self.long_term.len(),
        }
    }

    /// All short-term entries plus the best-scoring long-term ones,
    /// newest first, truncated to `limit`.
    pub fn recall(
        &self,
        query: &str,
        limit: usize,
        scorer: &dyn RelevanceScorer,
    ) -> Vec<MemoryEntry> {
        let mut ranked: Vec<(f64, &MemoryEntry)> = self
            .long_term
            .iter()
            .map(|entry| (scorer.score(query, entry), entry))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        ranked.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.recency().cmp(&a.1.recency()))
        });

        let mut merged: Vec<MemoryEntry> = self.short_term.iter().cloned().collect();
        merged.extend(ranked.into_iter().take(limit).map(|(_, e)| e.clone()));

        merged.sort_by(|a, b| b.recency().cmp(&a.recency()));
        merged.truncate(limit);
        merged
    }
}

impl Default for AgentMemory {
    fn default() -> Self {
        Self::new()
    }
}
