//! Agent module
//!
//! Roles and prompt templates, the runtime that executes a single task,
//! the task registry, and structured-reply extraction.

pub mod registry;
pub mod reply;
pub mod role;
pub mod runtime;

// Re-export commonly used types
pub use registry::{TaskRegistry, IMMEDIATE_PRIORITY};
pub use reply::{field_or_raw, parse_structured};
pub use role::{AgentRole, PromptTemplate};
pub use runtime::AgentRuntime;
