//! Agent memory
//!
//! Each agent owns a bucket with a bounded, newest-first short-term list
//! (FIFO overflow into long-term) and an unbounded long-term list ranked by
//! a pluggable relevance scorer at recall time.

pub mod relevance;
pub mod store;
pub mod types;

pub use relevance::{term_overlap, RelevanceScorer, TermOverlapScorer};
pub use store::MemoryStore;
pub use types::{AgentMemory, MemoryEntry, MemoryStats, SHORT_TERM_CAPACITY};
