//! Agent runtime - executes one task
//!
//! Flow per task:
//! 1. Recall relevant memories for the task input
//! 2. Pick the role/stage template
//! 3. Append context and the rendered memories
//! 4. Complete the prompt
//! 5. Remember the (input, output) pair
//! 6. Return the raw reply; structured parsing is the caller's job
//!
//! No retries happen here. A failed or empty completion is an error.

use crate::errors::{NetError, Result};
use crate::memory::{MemoryEntry, MemoryStore};
use crate::providers::ModelClient;
use crate::types::{Task, STAGE_KEY};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Memories recalled per task
pub const DEFAULT_RECALL_LIMIT: usize = 5;

/// Longest memory output rendered into a prompt
const MAX_MEMORY_CHARS: usize = 500;

pub struct AgentRuntime {
    memory: Arc<MemoryStore>,
    model: ModelClient,
    recall_limit: usize,
}

impl AgentRuntime {
    pub fn new(memory: Arc<MemoryStore>, model: ModelClient) -> Self {
        Self::with_recall_limit(memory, model, DEFAULT_RECALL_LIMIT)
    }

    pub fn with_recall_limit(memory: Arc<MemoryStore>, model: ModelClient, recall_limit: usize) -> Self {
        Self {
            memory,
            model,
            recall_limit,
        }
    }

    /// Run the task's prompt and return the raw reply
    pub async fn execute(&self, task: &Task) -> Result<String> {
        let memories = self
            .memory
            .retrieve(&task.agent_id, &task.input, self.recall_limit)
            .await;

        let prompt = build_prompt(task, &memories);
        debug!(task_id = %task.id, role = %task.agent_role, memories = memories.len(), "executing task");

        let output = self.model.complete(&prompt).await?;
        if output.trim().is_empty() {
            return Err(NetError::Provider("Empty response from provider".to_string()));
        }

        let mut metadata: HashMap<String, Value> = HashMap::new();
        metadata.insert("taskId".to_string(), Value::String(task.id.clone()));
        if let Some(stage) = task.stage() {
            metadata.insert(STAGE_KEY.to_string(), Value::String(stage.to_string()));
        }
        self.memory
            .store(&task.agent_id, &task.input, &output, metadata)
            .await;

        Ok(output)
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    pub fn model(&self) -> &ModelClient {
        &self.model
    }
}

/// Compose template prefix, request, context, and recalled memories
pub fn build_prompt(task: &Task, memories: &[MemoryEntry]) -> String {
    let template = task.agent_role.template(task.stage());
    let mut parts = vec![template.prefix()];

    parts.push(format!("## Request\n{}", task.input));

    if let Some(context) = task.context.as_deref().filter(|c| !c.trim().is_empty()) {
        parts.push(format!("## Context\n{}", context));
    }

    if !memories.is_empty() {
        let rendered: Vec<String> = memories
            .iter()
            .enumerate()
            .map(|(i, m)| {
                format!(
                    "{}. [{}]\n   Input: {}\n   Output: {}",
                    i + 1,
                    m.timestamp.to_rfc3339(),
                    m.input,
                    truncate(&m.output, MAX_MEMORY_CHARS)
                )
            })
            .collect();
        parts.push(format!("## Relevant history\n{}", rendered.join("\n")));
    }

    parts.join("\n\n")
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}... (truncated)", head)
    } else {
        text.to_string()
    }
}
