//! Deployment workflow: planning → generation → testing → deployment
//!
//! All-or-nothing: any device that rejects the configuration fails the
//! pipeline, though every device's result stays in the stage output. Nothing
//! already applied is rolled back.

use crate::agent::{field_or_raw, AgentRole};
use crate::bulk::OperationType;
use crate::errors::{NetError, Result};
use crate::pipeline::orchestrator::{require_devices, PipelineOrchestrator, StageFailure, StageResult};
use crate::pipeline::types::{Pipeline, PipelineType};
use crate::types::{RunHandle, TaskRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

const PLANNING_PRIORITY: i32 = 3;
const GENERATION_PRIORITY: i32 = 4;

/// Stage progress checkpoints
const PROGRESS: [u8; 4] = [25, 50, 75, 100];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    /// Natural-language description of the change
    pub intent: String,
    pub device_ids: Vec<String>,
}

impl DeploymentRequest {
    pub fn new(intent: impl Into<String>, device_ids: Vec<String>) -> Self {
        Self {
            intent: intent.into(),
            device_ids,
        }
    }
}

impl PipelineOrchestrator {
    pub async fn create_deployment_pipeline(
        &self,
        request: DeploymentRequest,
    ) -> Result<RunHandle<Pipeline>> {
        let intent = request.intent.trim().to_string();
        if intent.is_empty() {
            return Err(NetError::InvalidInput("Deployment intent is empty".into()));
        }
        let device_ids = require_devices(request.device_ids)?;

        let input = json!({ "intent": intent, "deviceIds": device_ids });
        let handle = self
            .launch(PipelineType::Deployment, input, move |this, id| async move {
                this.run_deployment(&id, &intent, &device_ids).await
            })
            .await;
        Ok(handle)
    }

    async fn run_deployment(&self, id: &str, intent: &str, device_ids: &[String]) -> Result<()> {
        self.start(id).await?;

        let Some(planning) = self
            .run_stage(id, 0, PROGRESS[0], self.plan(intent, &device_ids[0]))
            .await?
        else {
            return Ok(());
        };
        let plan = planning["plan"].as_str().unwrap_or_default().to_string();

        let Some(generation) = self
            .run_stage(id, 1, PROGRESS[1], self.generate(intent, &plan, &device_ids[0]))
            .await?
        else {
            return Ok(());
        };
        let configuration = generation["configuration"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        if self
            .run_stage(id, 2, PROGRESS[2], self.test(&configuration))
            .await?
            .is_none()
        {
            return Ok(());
        }

        let Some(deployment) = self
            .run_stage(id, 3, PROGRESS[3], self.deploy(&configuration, device_ids))
            .await?
        else {
            return Ok(());
        };

        self.finish(
            id,
            json!({
                "plan": plan,
                "configuration": configuration,
                "results": deployment["results"],
            }),
        )
        .await
    }

    /// Planning uses the first target as representative context
    async fn plan(&self, intent: &str, device_id: &str) -> StageResult {
        let context = self.simulator.describe(device_id).await?;
        let task = self
            .run_task(
                TaskRequest::new(AgentRole::Configuration, intent)
                    .with_context(context)
                    .with_priority(PLANNING_PRIORITY)
                    .with_stage("planning"),
            )
            .await?;

        let output = task.output.unwrap_or_default();
        Ok(json!({ "taskId": task.id, "plan": field_or_raw(&output, "plan") }))
    }

    async fn generate(&self, intent: &str, plan: &str, device_id: &str) -> StageResult {
        let context = self.simulator.describe(device_id).await?;
        let input = format!(
            "Generate the complete device configuration for: {}\n\nPlan:\n{}",
            intent, plan
        );
        let task = self
            .run_task(
                TaskRequest::new(AgentRole::Configuration, input)
                    .with_context(context)
                    .with_priority(GENERATION_PRIORITY)
                    .with_stage("generation"),
            )
            .await?;

        let output = task.output.unwrap_or_default();
        let configuration = field_or_raw(&output, "configuration");
        if configuration.trim().is_empty() {
            return Err(NetError::Generic("Generated configuration is empty".into()).into());
        }
        Ok(json!({ "taskId": task.id, "configuration": configuration }))
    }

    async fn test(&self, configuration: &str) -> StageResult {
        let issues = self.bulk.validate_configuration(configuration);
        if issues.is_empty() {
            return Ok(json!({ "valid": true, "issues": [] }));
        }

        Err(StageFailure::with_output(
            NetError::ValidationFailure(issues.clone()),
            json!({ "valid": false, "issues": issues }),
        ))
    }

    async fn deploy(&self, configuration: &str, device_ids: &[String]) -> StageResult {
        let outcomes = self
            .bulk
            .execute_on_devices(OperationType::Configuration, device_ids, configuration)
            .await;

        let mut results = Map::new();
        let mut failed = Vec::new();
        for (device_id, result) in outcomes {
            if !result.success {
                failed.push(device_id.clone());
            }
            results.insert(device_id, serde_json::to_value(&result).map_err(NetError::from)?);
        }
        failed.sort();

        let output = json!({ "results": Value::Object(results) });
        if failed.is_empty() {
            info!(devices = device_ids.len(), "configuration deployed to every device");
            Ok(output)
        } else {
            Err(StageFailure::with_output(
                NetError::DeploymentFailure { failed },
                output,
            ))
        }
    }
}
