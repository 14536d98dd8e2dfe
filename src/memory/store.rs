//! Process-wide memory store: one bucket per agent

use crate::memory::relevance::{RelevanceScorer, TermOverlapScorer};
use crate::memory::types::{AgentMemory, MemoryEntry, MemoryStats, SHORT_TERM_CAPACITY};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Memory store shared by every agent runtime
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, AgentMemory>>,
    capacity: usize,
    scorer: Box<dyn RelevanceScorer>,
    sequence: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(SHORT_TERM_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_scorer(capacity, Box::new(TermOverlapScorer))
    }

    /// Swap in a different ranker without touching callers
    pub fn with_scorer(capacity: usize, scorer: Box<dyn RelevanceScorer>) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            capacity,
            scorer,
            sequence: AtomicU64::new(0),
        }
    }

    /// Remember an exchange; returns the new entry id
    pub async fn store(
        &self,
        agent_id: &str,
        input: &str,
        output: &str,
        metadata: HashMap<String, Value>,
    ) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let entry = MemoryEntry::new(input, output, metadata, seq);
        let id = entry.id.clone();

        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry(agent_id.to_string())
            .or_insert_with(|| AgentMemory::with_capacity(self.capacity));

        if let Some(evicted) = bucket.push(entry) {
            debug!(agent_id, entry_id = %evicted, "moved memory entry to long-term");
        }
        id
    }

    /// Most relevant/recent entries for `query`, newest first
    pub async fn retrieve(&self, agent_id: &str, query: &str, limit: usize) -> Vec<MemoryEntry> {
        let buckets = self.buckets.read().await;
        buckets
            .get(agent_id)
            .map(|bucket| bucket.recall(query, limit, self.scorer.as_ref()))
            .unwrap_or_default()
    }

    pub async fn clear_short_term(&self, agent_id: &str) {
        if let Some(bucket) = self.buckets.write().await.get_mut(agent_id) {
            bucket.clear_short_term();
        }
    }

    pub async fn consolidate(&self, agent_id: &str) {
        if let Some(bucket) = self.buckets.write().await.get_mut(agent_id) {
            bucket.consolidate();
        }
    }

    pub async fn stats(&self, agent_id: &str) -> MemoryStats {
        self.buckets
            .read()
            .await
            .get(agent_id)
            .map(|b| b.stats())
            .unwrap_or_default()
    }

    /// Snapshot of an agent's long-term entries
    pub async fn long_term(&self, agent_id: &str) -> Vec<MemoryEntry> {
        self.buckets
            .read()
            .await
            .get(agent_id)
            .map(|b| b.long_term().to_vec())
            .unwrap_or_default()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_eleven_entries_evicts_first() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..11 {
            ids.push(
                store
                    .store("agent-1", &format!("input {}", i), "out", HashMap::new())
                    .await,
            );
        }

        let stats = store.stats("agent-1").await;
        assert_eq!(stats.short_term, 10);
        assert_eq!(stats.long_term, 1);

        let long_term = store.long_term("agent-1").await;
        assert_eq!(long_term[0].id, ids[0]);
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let store = MemoryStore::new();
        store.store("a", "configure vlan", "ok", HashMap::new()).await;
        store.store("b", "configure ospf", "ok", HashMap::new()).await;

        let recalled = store.retrieve("a", "configure", 5).await;
        assert_eq!(recalled.len(), 1);
        assert_eq!(recalled[0].input, "configure vlan");
    }

    #[tokio::test]
    async fn test_clear_and_consolidate() {
        let store = MemoryStore::with_capacity(3);
        for i in 0..3 {
            store.store("a", &format!("q{}", i), "r", HashMap::new()).await;
        }

        store.consolidate("a").await;
        assert_eq!(store.stats("a").await, MemoryStats { short_term: 0, long_term: 3 });

        store.store("a", "q3", "r", HashMap::new()).await;
        store.clear_short_term("a").await;
        assert_eq!(store.stats("a").await.total(), 3);
    }

    #[tokio::test]
    async fn test_unknown_agent_is_empty() {
        let store = MemoryStore::new();
        assert!(store.retrieve("ghost", "anything", 5).await.is_empty());
        assert_eq!(store.stats("ghost").await.total(), 0);
    }
}
