//! Retrieval workflow: discovery → extraction → analysis
//!
//! Allow-partial: a device that cannot be read gets an `error` entry in each
//! stage's per-device map and the pipeline still completes.

use crate::agent::AgentRole;
use crate::device::DeviceConfig;
use crate::errors::{NetError, Result};
use crate::pipeline::orchestrator::{error_entry, require_devices, PipelineOrchestrator, StageResult};
use crate::pipeline::types::{Pipeline, PipelineType};
use crate::types::{RunHandle, TaskRequest};
use futures_util::future::join_all;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::warn;

const ANALYSIS_PRIORITY: i32 = 3;

/// Stage progress checkpoints
const PROGRESS: [u8; 3] = [33, 67, 100];

impl PipelineOrchestrator {
    pub async fn create_retrieval_pipeline(
        &self,
        device_ids: Vec<String>,
    ) -> Result<RunHandle<Pipeline>> {
        let device_ids = require_devices(device_ids)?;

        let input = json!({ "deviceIds": device_ids });
        let handle = self
            .launch(PipelineType::Retrieval, input, move |this, id| async move {
                this.run_retrieval(&id, &device_ids).await
            })
            .await;
        Ok(handle)
    }

    async fn run_retrieval(&self, id: &str, device_ids: &[String]) -> Result<()> {
        self.start(id).await?;

        if self
            .run_stage(id, 0, PROGRESS[0], self.discover(device_ids))
            .await?
            .is_none()
        {
            return Ok(());
        }

        let Some(extraction) = self
            .run_stage(id, 1, PROGRESS[1], self.extract(device_ids))
            .await?
        else {
            return Ok(());
        };

        let Some(analysis) = self
            .run_stage(id, 2, PROGRESS[2], self.analyze(device_ids, &extraction))
            .await?
        else {
            return Ok(());
        };

        self.finish(id, json!({ "analysisResults": analysis["analysisResults"] }))
            .await
    }

    /// Snapshot device facts
    async fn discover(&self, device_ids: &[String]) -> StageResult {
        let lookups = join_all(device_ids.iter().map(|id| self.simulator.get_device(id))).await;

        let mut devices = Map::new();
        for (id, lookup) in device_ids.iter().zip(lookups) {
            let entry = match lookup {
                Ok(device) => json!({
                    "name": device.name,
                    "hostname": device.hostname,
                    "model": device.model,
                    "version": device.version,
                    "mgmtAddress": device.mgmt_address,
                    "interfaces": device.interfaces,
                }),
                Err(e) => {
                    warn!(device_id = %id, error = %e, "discovery failed");
                    error_entry(e)
                }
            };
            devices.insert(id.clone(), entry);
        }

        Ok(json!({ "devices": Value::Object(devices) }))
    }

    /// Read running and startup configuration
    async fn extract(&self, device_ids: &[String]) -> StageResult {
        let reads = join_all(device_ids.iter().map(|id| self.simulator.get_config(id))).await;

        let mut configs = Map::new();
        for (id, read) in device_ids.iter().zip(reads) {
            let entry = match read {
                Ok(DeviceConfig { running, startup }) => {
                    json!({ "running": running, "startup": startup })
                }
                Err(e) => {
                    warn!(device_id = %id, error = %e, "extraction failed");
                    error_entry(e)
                }
            };
            configs.insert(id.clone(), entry);
        }

        Ok(json!({ "configs": Value::Object(configs) }))
    }

    /// Store each configuration as a document and ask for insights
    async fn analyze(&self, device_ids: &[String], extraction: &Value) -> StageResult {
        let analyses = join_all(device_ids.iter().map(|id| {
            let extracted = &extraction["configs"][id.as_str()];
            async move {
                match self.analyze_device(id, extracted).await {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(device_id = %id, error = %e, "analysis failed");
                        error_entry(e)
                    }
                }
            }
        }))
        .await;

        let results: Map<String, Value> = device_ids.iter().cloned().zip(analyses).collect();
        Ok(json!({ "analysisResults": Value::Object(results) }))
    }

    async fn analyze_device(&self, device_id: &str, extracted: &Value) -> Result<Value> {
        if let Some(error) = extracted.get("error").and_then(Value::as_str) {
            return Err(NetError::Generic(error.to_string()));
        }
        let running = extracted
            .get("running")
            .and_then(Value::as_str)
            .ok_or_else(|| NetError::Generic("No configuration extracted".into()))?;

        let device = self.simulator.get_device(device_id).await?;
        let metadata = HashMap::from([
            ("deviceId".to_string(), json!(device_id)),
            ("kind".to_string(), json!("running-config")),
        ]);
        let document_id = self
            .documents
            .add_document(
                &format!("{} running configuration", device.name),
                running,
                metadata,
            )
            .await;

        let task = self
            .run_task(
                TaskRequest::new(
                    AgentRole::Troubleshooting,
                    format!(
                        "Summarize the state of device {} and flag any problems",
                        device.name
                    ),
                )
                .with_context(device.describe())
                .with_priority(ANALYSIS_PRIORITY)
                .with_stage("analysis"),
            )
            .await?;

        Ok(json!({
            "documentId": document_id,
            "taskId": task.id,
            "insights": task.output.unwrap_or_default(),
        }))
    }
}
