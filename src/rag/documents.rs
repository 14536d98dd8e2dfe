//! Document store
//!
//! In-memory documents (device configurations captured by the retrieval
//! pipeline) ranked by term overlap against a query. A vector index can
//! replace the scoring without changing `add_document`/`search`.

use crate::memory::term_overlap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    sequence: u64,
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub score: usize,
}

#[derive(Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<String, Document>>,
    sequence: AtomicU64,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_document(
        &self,
        title: &str,
        content: &str,
        metadata: HashMap<String, Value>,
    ) -> String {
        let document = Document {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
        };
        let id = document.id.clone();
        debug!(document_id = %id, title, "stored document");

        self.documents.write().await.insert(id.clone(), document);
        id
    }

    pub async fn get_document(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }

    /// Ranked matches, best first
    ///
    /// Documents must carry every key/value in `filter`. Zero-score documents
    /// are dropped; equal scores rank newer documents first.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&HashMap<String, Value>>,
    ) -> Vec<SearchHit> {
        let documents = self.documents.read().await;

        let mut scored: Vec<(usize, u64, &Document)> = documents
            .values()
            .filter(|doc| {
                filter.map_or(true, |f| {
                    f.iter().all(|(k, v)| doc.metadata.get(k) == Some(v))
                })
            })
            .map(|doc| {
                let text = format!("{}\n{}", doc.title, doc.content);
                (term_overlap(query, &text), doc.sequence, doc)
            })
            .filter(|(score, _, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(score, _, doc)| SearchHit {
                id: doc.id.clone(),
                title: doc.title.clone(),
                score,
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
