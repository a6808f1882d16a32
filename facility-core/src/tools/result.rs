//! Structured tool result envelope and error model
//!
//! Every tool call returns an envelope with:
//! - Success or error status
//! - Provenance metadata (tool, argument hash, timing, calling agent)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Structured result envelope for tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultEnvelope {
    /// Result status and payload
    pub result: ToolResult,

    /// Provenance metadata for tracing
    pub provenance: ToolProvenance,
}

impl ToolResultEnvelope {
    /// Create a successful result envelope
    pub fn success(value: Value, provenance: ToolProvenance) -> Self {
        Self {
            result: ToolResult::Success { value },
            provenance,
        }
    }

    /// Create an error result envelope
    pub fn error(error: ToolError, provenance: ToolProvenance) -> Self {
        Self {
            result: ToolResult::Error { error },
            provenance,
        }
    }

    /// Check if this result represents success
    pub fn is_success(&self) -> bool {
        matches!(self.result, ToolResult::Success { .. })
    }

    /// Check if this result represents an error
    pub fn is_error(&self) -> bool {
        matches!(self.result, ToolResult::Error { .. })
    }

    /// Get the value if successful
    pub fn value(&self) -> Option<&Value> {
        match &self.result {
            ToolResult::Success { value } => Some(value),
            _ => None,
        }
    }

    /// Get the error if failed
    pub fn get_error(&self) -> Option<&ToolError> {
        match &self.result {
            ToolResult::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Tool execution result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    /// Tool executed successfully
    Success {
        /// The result value
        value: Value,
    },

    /// Tool execution failed
    Error {
        /// Structured error information
        error: ToolError,
    },
}

/// Structured tool error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    /// Error kind
    pub kind: ToolErrorKind,

    /// Human-readable error message
    pub message: String,
}

impl ToolError {
    /// Create a new tool error
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, message)
    }

    /// Create a serialization error
    pub fn serialization(err: serde_json::Error) -> Self {
        Self::new(ToolErrorKind::InvalidResponse, err.to_string())
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for ToolError {}

/// Error kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Tool produced output that could not be encoded
    InvalidResponse,

    /// Internal tool error
    Internal,
}

/// Provenance metadata for tracing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolProvenance {
    /// Tool name
    pub tool_name: String,

    /// Hash of input arguments
    pub args_hash: String,

    /// Timestamp when execution started
    pub started_at: DateTime<Utc>,

    /// Execution duration
    #[serde(with = "duration_millis")]
    pub duration: Duration,

    /// Agent that invoked the tool
    pub agent_id: Option<String>,

    /// Run ID for correlation
    pub trace_id: Option<String>,
}

impl ToolProvenance {
    /// Create new provenance
    pub fn new(tool_name: impl Into<String>, args_hash: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            args_hash: args_hash.into(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            agent_id: None,
            trace_id: None,
        }
    }

    /// Set duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
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
}

// Duration serialized as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
