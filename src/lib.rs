//! netpilot - network change orchestration engine
//!
//! Turns a natural-language intent into a staged workflow over simulated
//! network devices, delegating planning, configuration generation, and
//! analysis to a pluggable completion provider.
//!
//! # Architecture
//!
//! - **memory**: per-agent short/long-term recall
//! - **agent**: roles, runtime, and the task registry
//! - **device**: device state machine, fact extraction, validation
//! - **bulk**: concurrent fan-out to many devices
//! - **pipeline**: deployment and retrieval workflows
//! - **engine**: the process-wide store wiring it all together

pub mod errors;
pub mod types;
pub mod config;

// Leaf components
pub mod memory;
pub mod providers;
pub mod rag;

// Execution
pub mod agent;
pub mod device;
pub mod bulk;
pub mod pipeline;

pub mod engine;
pub mod cli;

// Re-export commonly used types
pub use config::Config;
pub use engine::Engine;
pub use errors::{NetError, Result};
pub use types::{ExecutionStatus, RunHandle};
