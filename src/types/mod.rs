//! Type definitions module
//!
//! Status state machine, run handles, and the task/agent entities shared
//! across modules.

pub mod handle;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use handle::RunHandle;
pub use status::{ExecutionStatus, StatusEvent};
pub use task::{Agent, Task, TaskFilter, TaskRequest, STAGE_KEY};
