//! Pipeline orchestrator
//!
//! Owns the pipeline registry and the stage-running machinery shared by the
//! deployment and retrieval workflows. Creation registers the pipeline, spawns
//! its run, and returns a handle at once; callers poll `get_pipeline` or await
//! the handle.

use crate::agent::TaskRegistry;
use crate::bulk::BulkExecutor;
use crate::device::DeviceSimulator;
use crate::errors::{NetError, Result};
use crate::pipeline::types::{Pipeline, PipelineFilter, PipelineType};
use crate::rag::DocumentStore;
use crate::types::{ExecutionStatus, RunHandle, Task, TaskRequest};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Why a stage failed, plus whatever it produced before failing
pub(crate) struct StageFailure {
    pub error: NetError,
    pub output: Option<Value>,
}

impl StageFailure {
    pub fn with_output(error: NetError, output: Value) -> Self {
        Self {
            error,
            output: Some(output),
        }
    }
}

impl From<NetError> for StageFailure {
    fn from(error: NetError) -> Self {
        Self {
            error,
            output: None,
        }
    }
}

pub(crate) type StageResult = std::result::Result<Value, StageFailure>;

#[derive(Clone)]
pub struct PipelineOrchestrator {
    pipelines: Arc<RwLock<HashMap<String, Pipeline>>>,
    pub(crate) registry: Arc<TaskRegistry>,
    pub(crate) simulator: Arc<DeviceSimulator>,
    pub(crate) bulk: BulkExecutor,
    pub(crate) documents: Arc<DocumentStore>,
}

impl PipelineOrchestrator {
    pub fn new(
        registry: Arc<TaskRegistry>,
        simulator: Arc<DeviceSimulator>,
        bulk: BulkExecutor,
        documents: Arc<DocumentStore>,
    ) -> Self {
        Self {
            pipelines: Arc::new(RwLock::new(HashMap::new())),
            registry,
            simulator,
            bulk,
            documents,
        }
    }

    /// Register a pipeline and spawn `run` for it
    pub(crate) async fn launch<F, Fut>(
        &self,
        pipeline_type: PipelineType,
        input: Value,
        run: F,
    ) -> RunHandle<Pipeline>
    where
        F: FnOnce(PipelineOrchestrator, String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let pipeline = Pipeline::new(pipeline_type, input);
        let id = pipeline.id.clone();
        info!(pipeline_id = %id, pipeline_type = %pipeline_type, "created pipeline");
        self.pipelines
            .write()
            .await
            .insert(id.clone(), pipeline.clone());

        let this = self.clone();
        let run_id = id.clone();
        let join = tokio::spawn(async move {
            let worker = run(this.clone(), run_id.clone());
            let failure = match tokio::spawn(worker).await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("Pipeline aborted: {}", e)),
            };
            if let Some(message) = failure {
                error!(pipeline_id = %run_id, error = %message, "pipeline run failed");
                this.mark_failed(&run_id, message).await;
            }
        });

        RunHandle::new(id, pipeline, join)
    }

    pub(crate) async fn start(&self, id: &str) -> Result<()> {
        self.update(id, |p| p.start()).await
    }

    /// Run one stage to a terminal state
    ///
    /// Returns the stage output on success and `None` once the stage (and so
    /// the pipeline) has failed. `Err` means the bookkeeping itself broke.
    pub(crate) async fn run_stage<Fut>(
        &self,
        id: &str,
        index: usize,
        progress: u8,
        work: Fut,
    ) -> Result<Option<Value>>
    where
        Fut: Future<Output = StageResult>,
    {
        self.update(id, |p| p.start_stage(index)).await?;

        match work.await {
            Ok(output) => {
                self.update(id, |p| p.complete_stage(index, output.clone(), progress))
                    .await?;
                info!(pipeline_id = %id, stage = index, progress, "stage completed");
                Ok(Some(output))
            }
            Err(failure) => {
                let message = failure.error.to_string();
                warn!(pipeline_id = %id, stage = index, error = %message, "stage failed");
                self.update(id, |p| p.fail_stage(index, message, failure.output))
                    .await?;
                Ok(None)
            }
        }
    }

    pub(crate) async fn finish(&self, id: &str, output: Value) -> Result<()> {
        self.update(id, |p| p.complete(output)).await?;
        info!(pipeline_id = %id, "pipeline completed");
        Ok(())
    }

    async fn update<F>(&self, id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Pipeline) -> Result<()>,
    {
        let mut pipelines = self.pipelines.write().await;
        let pipeline = pipelines
            .get_mut(id)
            .ok_or_else(|| NetError::not_found("Pipeline", id))?;
        f(pipeline)
    }

    async fn mark_failed(&self, id: &str, message: String) {
        let mut pipelines = self.pipelines.write().await;
        if let Some(pipeline) = pipelines.get_mut(id) {
            if !pipeline.status.is_terminal() {
                if pipeline.status == ExecutionStatus::Pending {
                    let _ = pipeline.start();
                }
                let _ = pipeline.fail(message);
            }
        }
    }

    /// Create and run a task, failing when the task itself failed
    pub(crate) async fn run_task(&self, request: TaskRequest) -> Result<Task> {
        let mut task = self.registry.create_task(request).await?;
        if task.status == ExecutionStatus::Pending {
            task = self.registry.execute_task(&task.id).await?;
        }

        match task.status {
            ExecutionStatus::Completed => Ok(task),
            _ => Err(NetError::Generic(format!(
                "Task {} failed: {}",
                task.id,
                task.error.as_deref().unwrap_or("unknown error")
            ))),
        }
    }

    pub async fn get_pipeline(&self, id: &str) -> Result<Pipeline> {
        self.pipelines
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| NetError::not_found("Pipeline", id))
    }

    /// Matching pipelines, newest first
    pub async fn list_pipelines(&self, filter: &PipelineFilter) -> Vec<Pipeline> {
        let mut pipelines: Vec<Pipeline> = self
            .pipelines
            .read()
            .await
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        pipelines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pipelines
    }
}

/// `{"error": message}` entry for per-device results
pub(crate) fn error_entry(error: impl ToString) -> Value {
    json!({ "error": error.to_string() })
}

pub(crate) fn require_devices(device_ids: Vec<String>) -> Result<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let ids: Vec<String> = device_ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .collect();

    if ids.is_empty() {
        return Err(NetError::InvalidInput(
            "Pipeline needs at least one target device".into(),
        ));
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_devices() {
        assert!(require_devices(vec![]).is_err());
        assert!(require_devices(vec!["  ".into()]).is_err());
        assert_eq!(
            require_devices(vec!["a".into(), "b".into(), "a".into()]).unwrap(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_stage_failure_from_error() {
        let failure: StageFailure = NetError::InvalidInput("x".into()).into();
        assert!(failure.output.is_none());
        let failure = StageFailure::with_output(NetError::ValidationFailure(vec![]), json!({}));
        assert!(failure.output.is_some());
    }
}
