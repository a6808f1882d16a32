//! Tool system for the assessment stages
//!
//! Tools are the data-producing side of each stage. Key features:
//! - A small async [`Tool`] trait with JSON arguments
//! - Structured result envelopes with provenance
//! - A name-keyed [`ToolRegistry`] for lookup and listing
//!
//! # Example
//!
//! ```rust,no_run
//! use facility_core::tools::{PropertySearchTool, Tool, ToolExecutionContext};
//!
//! # async fn demo() {
//! let tool = PropertySearchTool::new();
//! let ctx = ToolExecutionContext::new().with_agent_id("Property Searcher");
//! let envelope = tool
//!     .execute(serde_json::json!({ "location": "Miami" }), &ctx)
//!     .await
//!     .unwrap();
//! assert!(envelope.is_success());
//! # }
//! ```

mod assessment;
mod registry;
mod result;
mod tool;

pub use assessment::{
    CommunityAssessmentTool, FacilityPlanningTool, PropertySearchTool, ZoningAnalysisTool,
    sample_property,
};
pub use registry::{RegistryError, ToolRegistry, ToolSummary};
pub use result::{ToolError, ToolErrorKind, ToolProvenance, ToolResult, ToolResultEnvelope};
pub use tool::{BoxedTool, Tool, ToolExecutionContext, ToolMetadata, ToolSchema, args_hash};

/// Registry holding the four stage tools.
pub fn stage_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register_all(vec![
        std::sync::Arc::new(PropertySearchTool::new()),
        std::sync::Arc::new(ZoningAnalysisTool::new()),
        std::sync::Arc::new(CommunityAssessmentTool::new()),
        std::sync::Arc::new(FacilityPlanningTool::new()),
    ])?;
    Ok(registry)
}
