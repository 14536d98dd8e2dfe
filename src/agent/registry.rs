//! Task registry
//!
//! Owns agents and tasks for the lifetime of the process. Tasks at or above
//! the immediate-priority threshold run inside `create_task`; the rest stay
//! `pending` until someone calls `execute_task`. Nothing drains them in the
//! background.

use crate::agent::{AgentRole, AgentRuntime};
use crate::errors::{NetError, Result};
use crate::types::{Agent, ExecutionStatus, Task, TaskFilter, TaskRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Default priority at which tasks execute on creation
pub const IMMEDIATE_PRIORITY: i32 = 5;

pub struct TaskRegistry {
    agents: RwLock<HashMap<String, Agent>>,
    tasks: RwLock<HashMap<String, Task>>,
    runtime: Arc<AgentRuntime>,
    immediate_priority: i32,
}

impl TaskRegistry {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self::with_threshold(runtime, IMMEDIATE_PRIORITY)
    }

    pub fn with_threshold(runtime: Arc<AgentRuntime>, immediate_priority: i32) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            tasks: RwLock::new(HashMap::new()),
            runtime,
            immediate_priority,
        }
    }

    pub async fn register_agent(&self, role: AgentRole, name: &str) -> Agent {
        let agent = Agent::new(role, name);
        info!(agent_id = %agent.id, role = %role, name, "registered agent");
        self.agents
            .write()
            .await
            .insert(agent.id.clone(), agent.clone());
        agent
    }

    pub async fn get_agent(&self, id: &str) -> Result<Agent> {
        self.agents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| NetError::not_found("Agent", id))
    }

    /// Agents, oldest first
    pub async fn list_agents(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self.agents.read().await.values().cloned().collect();
        agents.sort_by_key(|a| a.created_at);
        agents
    }

    /// First-registered agent with the role
    pub async fn agent_for_role(&self, role: AgentRole) -> Result<Agent> {
        self.agents
            .read()
            .await
            .values()
            .filter(|a| a.role == role)
            .min_by_key(|a| a.created_at)
            .cloned()
            .ok_or_else(|| NetError::NoAgentForRole(role.to_string()))
    }

    /// Create a task; high-priority tasks run before this returns
    pub async fn create_task(&self, request: TaskRequest) -> Result<Task> {
        let agent = self.agent_for_role(request.role).await?;
        let task = Task::new(&agent, request);
        let id = task.id.clone();

        info!(task_id = %id, role = %agent.role, priority = task.priority, "created task");
        self.tasks.write().await.insert(id.clone(), task.clone());

        if task.priority >= self.immediate_priority {
            return self.execute_task(&id).await;
        }
        Ok(task)
    }

    /// Run a pending task to a terminal state and return it
    ///
    /// Execution failures end up in `task.error`; only unknown IDs and
    /// non-pending tasks are returned as `Err`.
    pub async fn execute_task(&self, id: &str) -> Result<Task> {
        let agent_id = self.get_task(id).await?.agent_id;
        self.get_agent(&agent_id).await?;

        let snapshot = {
            let mut tasks = self.tasks.write().await;
            let task = tasks
                .get_mut(id)
                .ok_or_else(|| NetError::not_found("Task", id))?;
            task.start()?;
            task.clone()
        };

        let result = self.runtime.execute(&snapshot).await;

        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| NetError::not_found("Task", id))?;

        match result {
            Ok(output) => {
                task.complete(output)?;
                info!(task_id = %id, "task completed");
            }
            Err(e) => {
                warn!(task_id = %id, error = %e, "task failed");
                task.fail(e.to_string())?;
            }
        }

        Ok(task.clone())
    }

    pub async fn get_task(&self, id: &str) -> Result<Task> {
        self.tasks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| NetError::not_found("Task", id))
    }

    /// Matching tasks, newest first
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    /// Pending tasks waiting for an explicit trigger
    pub async fn pending_tasks(&self) -> Vec<Task> {
        self.list_tasks(&TaskFilter {
            status: Some(ExecutionStatus::Pending),
            ..Default::default()
        })
        .await
    }

    pub fn runtime(&self) -> &Arc<AgentRuntime> {
        &self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::providers::{CompletionOptions, ModelClient, ScriptedProvider};
    use std::time::Duration;

    fn registry(provider: ScriptedProvider) -> TaskRegistry {
        let model = ModelClient::new(
            Arc::new(provider),
            CompletionOptions::default(),
            Duration::from_secs(5),
        );
        let runtime = AgentRuntime::new(Arc::new(MemoryStore::new()), model);
        TaskRegistry::new(Arc::new(runtime))
    }

    #[tokio::test]
    async fn test_create_without_agent_fails() {
        let registry = registry(ScriptedProvider::fixed("ok"));
        let err = registry
            .create_task(TaskRequest::new(AgentRole::Deployment, "roll out"))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::NoAgentForRole(_)));
    }

    #[tokio::test]
    async fn test_low_priority_stays_pending() {
        let registry = registry(ScriptedProvider::fixed("ok"));
        registry.register_agent(AgentRole::Configuration, "config").await;

        let task = registry
            .create_task(TaskRequest::new(AgentRole::Configuration, "plan").with_priority(4))
            .await
            .unwrap();
        assert_eq!(task.status, ExecutionStatus::Pending);
        assert_eq!(registry.pending_tasks().await.len(), 1);

        let done = registry.execute_task(&task.id).await.unwrap();
        assert_eq!(done.status, ExecutionStatus::Completed);
        assert_eq!(done.output.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_high_priority_runs_immediately() {
        let registry = registry(ScriptedProvider::fixed("done"));
        registry.register_agent(AgentRole::Validation, "val").await;

        let task = registry
            .create_task(TaskRequest::new(AgentRole::Validation, "check").with_priority(5))
            .await
            .unwrap();
        assert_eq!(task.status, ExecutionStatus::Completed);
        assert!(task.started_at.is_some());
    }

    #[tokio::test]
    async fn test_failure_captured_on_task() {
        let registry = registry(ScriptedProvider::failing("backend down"));
        registry.register_agent(AgentRole::Troubleshooting, "ts").await;

        let task = registry
            .create_task(TaskRequest::new(AgentRole::Troubleshooting, "diagnose").with_priority(9))
            .await
            .unwrap();
        assert_eq!(task.status, ExecutionStatus::Failed);
        assert!(task.error.unwrap().contains("backend down"));
        assert!(task.output.is_none());
    }

    #[tokio::test]
    async fn test_execute_unknown_and_finished_tasks() {
        let registry = registry(ScriptedProvider::fixed("ok"));
        registry.register_agent(AgentRole::Configuration, "config").await;

        assert!(matches!(
            registry.execute_task("nope").await,
            Err(NetError::NotFound { .. })
        ));

        let task = registry
            .create_task(TaskRequest::new(AgentRole::Configuration, "plan").with_priority(7))
            .await
            .unwrap();
        assert!(matches!(
            registry.execute_task(&task.id).await,
            Err(NetError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let registry = registry(ScriptedProvider::fixed("ok"));
        registry.register_agent(AgentRole::Configuration, "config").await;
        registry.register_agent(AgentRole::Validation, "val").await;

        registry
            .create_task(TaskRequest::new(AgentRole::Configuration, "a").with_priority(1))
            .await
            .unwrap();
        registry
            .create_task(TaskRequest::new(AgentRole::Validation, "b").with_priority(8))
            .await
            .unwrap();

        let completed = registry
            .list_tasks(&TaskFilter {
                status: Some(ExecutionStatus::Completed),
                ..Default::default()
            })
            .await;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].agent_role, AgentRole::Validation);

        let config = registry
            .list_tasks(&TaskFilter {
                role: Some(AgentRole::Configuration),
                ..Default::default()
            })
            .await;
        assert_eq!(config.len(), 1);
        assert_eq!(registry.list_tasks(&TaskFilter::default()).await.len(), 2);
        assert_eq!(registry.list_agents().await.len(), 2);
    }
}
