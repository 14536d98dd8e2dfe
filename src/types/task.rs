//! Agent and task entity types

use crate::agent::AgentRole;
use crate::errors::Result;
use crate::types::status::{ExecutionStatus, StatusEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Metadata key used to tag the pipeline stage a task belongs to
pub const STAGE_KEY: &str = "stage";

/// Priority used when a caller does not pick one
pub const DEFAULT_PRIORITY: i32 = 1;

/// A role-bound execution unit; immutable after registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: AgentRole,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    pub fn new(role: AgentRole, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            role,
            created_at: Utc::now(),
        }
    }
}

/// One unit of agent work
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub agent_id: String,
    pub agent_role: AgentRole,
    pub input: String,
    pub context: Option<String>,
    pub priority: i32,
    pub metadata: HashMap<String, Value>,
    pub status: ExecutionStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl Task {
    /// Build a pending task for an agent
    pub fn new(agent: &Agent, request: TaskRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent.id.clone(),
            agent_role: agent.role,
            input: request.input,
            context: request.context,
            priority: request.priority,
            metadata: request.metadata,
            status: ExecutionStatus::Pending,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            output: None,
            error: None,
        }
    }

    /// Pipeline stage tag, if any
    pub fn stage(&self) -> Option<&str> {
        self.metadata.get(STAGE_KEY).and_then(|v| v.as_str())
    }

    /// Pending → Running
    pub fn start(&mut self) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Start)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Running → Completed
    pub fn complete(&mut self, output: String) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Succeed)?;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Running → Failed
    pub fn fail(&mut self, error: String) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Fail)?;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

/// Parameters for creating a task
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub role: AgentRole,
    pub input: String,
    pub context: Option<String>,
    pub priority: i32,
    pub metadata: HashMap<String, Value>,
}

impl TaskRequest {
    pub fn new(role: AgentRole, input: impl Into<String>) -> Self {
        Self {
            role,
            input: input.into(),
            context: None,
            priority: DEFAULT_PRIORITY,
            metadata: HashMap::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_stage(self, stage: &str) -> Self {
        self.with_metadata(STAGE_KEY, Value::String(stage.to_string()))
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Listing filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<ExecutionStatus>,
    pub role: Option<AgentRole>,
    pub agent_id: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.role.map_or(true, |r| task.agent_role == r)
            && self
                .agent_id
                .as_deref()
                .map_or(true, |id| task.agent_id == id)
    }
}
