//! Pipeline and stage entity types
//!
//! Stage order is fixed per pipeline type. A stage may only start once every
//! stage before it has completed; the first failed stage fails the pipeline
//! and leaves the remaining stages pending.

use crate::errors::{NetError, Result};
use crate::types::{ExecutionStatus, StatusEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const DEPLOYMENT_STAGES: [&str; 4] = ["planning", "generation", "testing", "deployment"];
pub const RETRIEVAL_STAGES: [&str; 3] = ["discovery", "extraction", "analysis"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineType {
    Deployment,
    Retrieval,
}

impl PipelineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineType::Deployment => "deployment",
            PipelineType::Retrieval => "retrieval",
        }
    }

    /// Declared stage names, in execution order
    pub fn stage_names(&self) -> &'static [&'static str] {
        match self {
            PipelineType::Deployment => &DEPLOYMENT_STAGES,
            PipelineType::Retrieval => &RETRIEVAL_STAGES,
        }
    }
}

impl fmt::Display for PipelineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineType {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "deployment" => Ok(PipelineType::Deployment),
            "retrieval" => Ok(PipelineType::Retrieval),
            other => Err(NetError::InvalidInput(format!(
                "Unknown pipeline type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: String,
    pub name: String,
    pub status: ExecutionStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Stage {
    fn new(name: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            status: ExecutionStatus::Pending,
            output: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: String,
    #[serde(rename = "type")]
    pub pipeline_type: PipelineType,
    pub stages: Vec<Stage>,
    pub status: ExecutionStatus,
    pub progress: u8,
    pub input: Value,
    pub output: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Pipeline {
    pub fn new(pipeline_type: PipelineType, input: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            pipeline_type,
            stages: pipeline_type
                .stage_names()
                .iter()
                .map(|name| Stage::new(name))
                .collect(),
            status: ExecutionStatus::Pending,
            progress: 0,
            input,
            output: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn start(&mut self) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Start)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Start stage `index`; every earlier stage must have completed
    pub fn start_stage(&mut self, index: usize) -> Result<()> {
        if self.status != ExecutionStatus::Running {
            return Err(NetError::InvalidTransition {
                from: self.status.to_string(),
                to: format!("stage {}", index),
                reason: "Pipeline is not running".to_string(),
            });
        }

        if let Some(blocking) = self.stages[..index.min(self.stages.len())]
            .iter()
            .find(|s| s.status != ExecutionStatus::Completed)
        {
            return Err(NetError::InvalidTransition {
                from: blocking.status.to_string(),
                to: format!("stage {}", index),
                reason: format!("Stage '{}' has not completed", blocking.name),
            });
        }

        let stage = self.stage_mut(index)?;
        stage.status = stage.status.transition(StatusEvent::Start)?;
        stage.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn complete_stage(&mut self, index: usize, output: Value, progress: u8) -> Result<()> {
        let stage = self.stage_mut(index)?;
        stage.status = stage.status.transition(StatusEvent::Succeed)?;
        stage.output = Some(output);
        stage.completed_at = Some(Utc::now());
        self.progress = self.progress.max(progress);
        Ok(())
    }

    /// Fail stage `index` and, with it, the pipeline
    pub fn fail_stage(&mut self, index: usize, error: String, output: Option<Value>) -> Result<()> {
        let stage = self.stage_mut(index)?;
        stage.status = stage.status.transition(StatusEvent::Fail)?;
        stage.output = output;
        stage.error = Some(error.clone());
        stage.completed_at = Some(Utc::now());
        self.fail(error)
    }

    pub fn complete(&mut self, output: Value) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Succeed)?;
        self.output = Some(output);
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: String) -> Result<()> {
        self.status = self.status.transition(StatusEvent::Fail)?;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn stage_mut(&mut self, index: usize) -> Result<&mut Stage> {
        let count = self.stages.len();
        self.stages.get_mut(index).ok_or_else(|| {
            NetError::InvalidInput(format!("Stage index {} out of range ({})", index, count))
        })
    }
}

/// Listing filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct PipelineFilter {
    pub status: Option<ExecutionStatus>,
    pub pipeline_type: Option<PipelineType>,
}

impl PipelineFilter {
    pub fn matches(&self, pipeline: &Pipeline) -> bool {
        self.status.map_or(true, |s| pipeline.status == s)
            && self
                .pipeline_type
                .map_or(true, |t| pipeline.pipeline_type == t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn running(pipeline_type: PipelineType) -> Pipeline {
        let mut p = Pipeline::new(pipeline_type, json!({}));
        p.start().unwrap();
        p
    }

    #[test]
    fn test_stages_declared_in_order() {
        let p = Pipeline::new(PipelineType::Deployment, json!({}));
        let names: Vec<&str> = p.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, DEPLOYMENT_STAGES);
        assert!(p.stages.iter().all(|s| s.status == ExecutionStatus::Pending));
    }

    #[test]
    fn test_stage_cannot_skip_predecessor() {
        let mut p = running(PipelineType::Retrieval);
        assert!(matches!(
            p.start_stage(1),
            Err(NetError::InvalidTransition { .. })
        ));

        p.start_stage(0).unwrap();
        p.complete_stage(0, json!({}), 33).unwrap();
        p.start_stage(1).unwrap();
        assert_eq!(p.stages[1].status, ExecutionStatus::Running);
        assert_eq!(p.progress, 33);
    }

    #[test]
    fn test_failed_stage_fails_pipeline() {
        let mut p = running(PipelineType::Deployment);
        p.start_stage(0).unwrap();
        p.complete_stage(0, json!({"plan": "x"}), 25).unwrap();
        p.start_stage(1).unwrap();
        p.fail_stage(1, "provider down".into(), None).unwrap();

        assert_eq!(p.status, ExecutionStatus::Failed);
        assert_eq!(p.error.as_deref(), Some("provider down"));
        assert_eq!(p.stages[0].status, ExecutionStatus::Completed);
        assert_eq!(p.stages[2].status, ExecutionStatus::Pending);
        assert!(p.start_stage(2).is_err());
    }

    #[test]
    fn test_serialized_shape() {
        let p = Pipeline::new(PipelineType::Retrieval, json!({"deviceIds": []}));
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["type"], "retrieval");
        assert_eq!(value["stages"][2]["name"], "analysis");
        assert_eq!(value["progress"], 0);
    }
}
