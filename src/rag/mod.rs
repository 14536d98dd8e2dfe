//! Retrieval-augmented document store
//!
//! Consumed by the retrieval pipeline's analysis stage; device configurations
//! are stored here for later querying.

pub mod documents;

pub use documents::{Document, DocumentStore, SearchHit};
