//! Device module
//!
//! Simulated devices, advisory fact extraction from configuration text, and
//! the heuristic configuration validator used before deployment.

pub mod extract;
pub mod simulator;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use extract::{apply_facts, extract_facts, ExtractedFacts};
pub use simulator::{DeviceSimulator, CLI_PROMPT_HEADER, REVIEW_PROMPT_HEADER};
pub use types::{CommandResult, Device, DeviceConfig, Interface, InterfaceStatus};
pub use validation::{ConfigValidator, ValidatorConfig};
