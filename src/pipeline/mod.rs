//! Pipeline module
//!
//! Named multi-stage workflows composed from agent tasks, device operations,
//! and bulk fan-out:
//! - deployment: planning → generation → testing → deployment (all-or-nothing)
//! - retrieval: discovery → extraction → analysis (allow-partial)

pub mod deployment;
pub mod orchestrator;
pub mod retrieval;
pub mod types;

// Re-export commonly used types
pub use deployment::DeploymentRequest;
pub use orchestrator::PipelineOrchestrator;
pub use types::{Pipeline, PipelineFilter, PipelineType, Stage, DEPLOYMENT_STAGES, RETRIEVAL_STAGES};
