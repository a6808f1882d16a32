//! Error types for facility finder operations

/// Result type for facility finder operations
pub type Result<T> = std::result::Result<T, FacilityError>;

/// Error types for the facility finder
#[derive(Debug, thiserror::Error)]
pub enum FacilityError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Memory operation failed
    #[error("Memory error: {0}")]
    Memory(String),

    /// Tool execution failed
    #[error("Tool error: {0}")]
    Tool(String),

    /// Workflow execution failed
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// A value violated its declared bounds
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for FacilityError {
    fn from(s: String) -> Self {
        FacilityError::Other(s)
    }
}

impl From<&str> for FacilityError {
    fn from(s: &str) -> Self {
        FacilityError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for FacilityError {
    fn from(err: anyhow::Error) -> Self {
        FacilityError::Other(err.to_string())
    }
}
