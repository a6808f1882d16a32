//! Tool trait and metadata definitions
//!
//! Tools are how agents gather the data they reason about.
//! Each tool declares its name, its parameter schema and its execution logic.

use super::result::{ToolError, ToolProvenance, ToolResultEnvelope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Tool metadata for LLM-friendly discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMetadata {
    /// Tool name (unique identifier)
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// What the tool returns
    pub returns: String,

    /// Tags for categorization
    pub tags: Vec<String>,
}

impl ToolMetadata {
    /// Create new metadata with required fields
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            returns: "Tool-specific result".to_string(),
            tags: Vec::new(),
        }
    }

    /// Set return description
    pub fn with_returns(mut self, returns: impl Into<String>) -> Self {
        self.returns = returns.into();
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// JSON Schema for tool parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// JSON Schema for input parameters
    pub parameters: Value,
}

impl ToolSchema {
    /// Create a schema from a JSON Schema value
    pub fn new(parameters: Value) -> Self {
        Self { parameters }
    }

    /// Schema for tools that take a single property record
    pub fn property_input() -> Self {
        Self::new(serde_json::json!({
            "type": "object",
            "properties": {
                "property": {
                    "type": "object",
                    "description": "Property record produced by the property search"
                }
            }
        }))
    }
}

/// Context provided to tool execution
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Agent making the call
    pub agent_id: Option<String>,

    /// Trace ID for correlation
    pub trace_id: Option<String>,
}

impl ToolExecutionContext {
    /// Create a new context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set agent ID
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Set trace ID
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Build provenance for a call that started at `started_at` with `args`.
    pub fn provenance(
        &self,
        tool_name: &str,
        args: &Value,
        started_at: DateTime<Utc>,
    ) -> ToolProvenance {
        let duration = (Utc::now() - started_at).to_std().unwrap_or_default();
        let mut provenance =
            ToolProvenance::new(tool_name, args_hash(args)).with_duration(duration);
        provenance.started_at = started_at;

        if let Some(ref agent_id) = self.agent_id {
            provenance = provenance.with_agent_id(agent_id);
        }
        if let Some(ref trace_id) = self.trace_id {
            provenance = provenance.with_trace_id(trace_id);
        }
        provenance
    }
}

/// Short SHA-256 digest of the canonical JSON form of `args`.
pub fn args_hash(args: &Value) -> String {
    let args_json = serde_json::to_string(args).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(args_json.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// Core tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool metadata
    fn metadata(&self) -> &ToolMetadata;

    /// Get tool name (convenience method)
    fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Get tool description (convenience method)
    fn description(&self) -> &str {
        &self.metadata().description
    }

    /// Get the JSON schema for this tool's parameters
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(
        &self,
        args: Value,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolResultEnvelope, ToolError>;
}

/// Type alias for boxed tools
pub type BoxedTool = Arc<dyn Tool>;

#[cfg(test)]
mod tool_tests {
    use super::*;

    struct EchoTool {
        metadata: ToolMetadata,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                metadata: ToolMetadata::new("echo", "Echoes input back")
                    .with_returns("The same value passed as input"),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn metadata(&self) -> &ToolMetadata {
            &self.metadata
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new(serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string" }
                }
            }))
        }

        async fn execute(
            &self,
            args: Value,
            ctx: &ToolExecutionContext,
        ) -> Result<ToolResultEnvelope, ToolError> {
            let started_at = Utc::now();
            let message = args.get("message").cloned().unwrap_or(Value::Null);
            let provenance = ctx.provenance(self.name(), &args, started_at);
            Ok(ToolResultEnvelope::success(message, provenance))
        }
    }

    #[tokio::test]
    async fn test_tool_execution() {
        let tool = EchoTool::new();
        let ctx = ToolExecutionContext::new().with_agent_id("test_agent");
        let args = serde_json::json!({ "message": "hello" });

        let result = tool.execute(args, &ctx).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.value().unwrap(), &serde_json::json!("hello"));
        assert_eq!(result.provenance.agent_id.as_deref(), Some("test_agent"));
    }

    #[test]
    fn test_args_hash_is_stable() {
        let a = args_hash(&serde_json::json!({"location": "Miami"}));
        let b = args_hash(&serde_json::json!({"location": "Miami"}));
        let c = args_hash(&serde_json::json!({"location": "Tampa"}));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }
}
