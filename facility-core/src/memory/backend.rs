//! Memory backend trait for pluggable storage implementations
//!
//! Agents only see [`MemoryBackend`]. The crate ships one implementation,
//! [`VectorMemory`](super::VectorMemory); tests are free to provide their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Core memory record returned by backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique identifier
    pub id: String,

    /// Memory content
    pub content: String,

    /// RFC 3339 timestamp when created
    pub created_at: String,

    /// Additional properties as JSON
    #[serde(default)]
    pub properties: serde_json::Value,

    /// Optional relevance score (from search results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Options for storing memories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Explicit id; storing under an existing id replaces that memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Memory type hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_type: Option<String>,

    /// Tags to associate with the memory
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Extra properties copied onto the record
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_memory_type(mut self, memory_type: impl Into<String>) -> Self {
        self.memory_type = Some(memory_type.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Fold the options into a record's property bag
    pub(crate) fn into_properties(self) -> serde_json::Value {
        let mut properties = self.properties;
        if let Some(memory_type) = self.memory_type {
            properties.insert("type".to_string(), serde_json::json!(memory_type));
        }
        if !self.tags.is_empty() {
            properties.insert("tags".to_string(), serde_json::json!(self.tags));
        }
        serde_json::Value::Object(properties)
    }
}

/// Options for searching memories
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Maximum number of results (backend default when unset)
    pub limit: Option<usize>,
}

impl QueryOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

/// The core memory backend trait
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Store a memory and return its ID
    async fn store(&self, content: String, options: Option<StoreOptions>) -> Result<String>;

    /// Search memories by query, most relevant first
    async fn search(&self, query: &str, options: Option<QueryOptions>)
    -> Result<Vec<MemoryRecord>>;

    /// Get a specific memory by ID
    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>>;

    /// Delete a memory by ID, returns true if it existed
    async fn delete(&self, id: &str) -> Result<bool>;

    /// Get total memory count
    async fn count(&self) -> Result<u64>;

    /// Health check - verify the backend is operational
    async fn health_check(&self) -> Result<()>;
}
