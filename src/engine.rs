//! Engine: the one process-wide store
//!
//! Builds every registry once and hands out shared references. Created at
//! start-up, dropped at shutdown; nothing survives a restart.

use crate::agent::{AgentRole, AgentRuntime, TaskRegistry};
use crate::bulk::BulkExecutor;
use crate::config::Config;
use crate::device::DeviceSimulator;
use crate::errors::Result;
use crate::memory::MemoryStore;
use crate::pipeline::PipelineOrchestrator;
use crate::providers::ModelClient;
use crate::rag::DocumentStore;
use std::sync::Arc;
use tracing::info;

pub struct Engine {
    config: Config,
    memory: Arc<MemoryStore>,
    registry: Arc<TaskRegistry>,
    simulator: Arc<DeviceSimulator>,
    bulk: BulkExecutor,
    documents: Arc<DocumentStore>,
    pipelines: PipelineOrchestrator,
}

impl Engine {
    /// Wire everything around `model` and register one agent per role
    pub async fn new(config: Config, model: ModelClient) -> Result<Self> {
        config.validate()?;

        let memory = Arc::new(MemoryStore::with_capacity(config.memory.short_term_capacity));
        let runtime = Arc::new(AgentRuntime::with_recall_limit(
            memory.clone(),
            model.clone(),
            config.memory.retrieval_limit,
        ));
        let registry = Arc::new(TaskRegistry::with_threshold(
            runtime,
            config.tasks.immediate_priority,
        ));
        for role in AgentRole::ALL {
            registry
                .register_agent(role, &format!("{}-agent", role))
                .await;
        }

        let simulator = Arc::new(DeviceSimulator::new(model.clone()));
        let bulk = BulkExecutor::new(simulator.clone(), config.bulk.max_parallel);
        let documents = Arc::new(DocumentStore::new());
        let pipelines = PipelineOrchestrator::new(
            registry.clone(),
            simulator.clone(),
            bulk.clone(),
            documents.clone(),
        );

        info!(
            provider = model.provider_name(),
            max_parallel = bulk.max_parallel(),
            "engine ready"
        );

        Ok(Self {
            config,
            memory,
            registry,
            simulator,
            bulk,
            documents,
            pipelines,
        })
    }

    /// Build the provider stack from the configuration, then the engine
    pub async fn from_config(config: Config) -> Result<Self> {
        let model = ModelClient::from_config(&config)?;
        Self::new(config, model).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    pub fn tasks(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn devices(&self) -> &Arc<DeviceSimulator> {
        &self.simulator
    }

    pub fn bulk(&self) -> &BulkExecutor {
        &self.bulk
    }

    pub fn documents(&self) -> &Arc<DocumentStore> {
        &self.documents
    }

    pub fn pipelines(&self) -> &PipelineOrchestrator {
        &self.pipelines
    }
}
