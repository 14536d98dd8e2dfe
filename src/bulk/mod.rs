//! Bulk operation module
//!
//! Fan-out of one command or configuration across many devices, with
//! per-device result attribution and aggregate progress.

pub mod executor;
pub mod types;

// Re-export commonly used types
pub use executor::{default_parallelism, BulkExecutor};
pub use types::{BulkFilter, BulkOperation, OperationType};
