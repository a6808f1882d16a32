//! Long-term memory for agents
//!
//! A single [`VectorMemory`] is shared by every stage agent. It recalls past
//! agent outputs and ingested property documents by embedding similarity.

pub mod backend;
pub mod vector;

pub use backend::{MemoryBackend, MemoryRecord, QueryOptions, StoreOptions};
pub use vector::{DistanceMetric, EMBEDDING_DIM, VectorMemory, embed};
