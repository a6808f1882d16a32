//! # Facility Finder
//!
//! Agent pipeline that sources, vets and plans properties for sober living
//! and drug rehabilitation facilities. Four LLM-backed stage agents run in a
//! fixed order:
//!
//! 1. **Property Searcher** finds candidate properties
//! 2. **Zoning Analyst** checks zoning and permits
//! 3. **Community Impact Assessor** scores the neighbourhood
//! 4. **Facility Planner** plans the conversion
//!
//! Each stage gets the previous stage's output as its task, plus typed
//! findings from its stage tool. The last output becomes the recommendation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use facility_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = FacilityConfig::load()?;
//!     let finder = FacilityFinder::from_config(config).await?;
//!
//!     let criteria = SearchCriteria::new("South Florida", 2_000_000.0);
//!     let recommendation = finder.find_rehab_facility_property(&criteria).await?;
//!
//!     ReportWriter::new("rehab_facility_recommendation.txt")
//!         .write(&recommendation)
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod finder;
pub mod llm;
pub mod logging;
pub mod memory;
mod persist;
pub mod prompts;
pub mod records;
pub mod report;
pub mod stages;
pub mod tools;
pub mod workflow;

pub use error::{FacilityError, Result};

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{AgentOutput, AgentState, FacilityAgent, FacilityAgentBuilder, ToolObservation};
    pub use crate::config::{
        AgentSettings, FacilityConfig, LlmProviderKind, LlmSettings, LoggingSettings,
        MemorySettings, ReportSettings, WorkflowSettings,
    };
    pub use crate::error::{FacilityError, Result};
    pub use crate::finder::{FacilityFinder, RECOMMENDATION_PREFIX, Recommendation};
    pub use crate::llm::{
        LLMConfig, LLMProvider, LLMProviderFactory, LLMRequest, LLMResponse, Message, MessageRole,
        OfflineProvider, OpenAIProvider,
    };
    pub use crate::memory::{DistanceMetric, MemoryBackend, MemoryRecord, VectorMemory};
    pub use crate::records::{
        CommunityRecord, PlanningRecord, PropertyRecord, Score, SearchCriteria, ZoningRecord,
    };
    pub use crate::report::ReportWriter;
    pub use crate::stages::{Stage, StageRoster};
    pub use crate::tools::{
        BoxedTool, CommunityAssessmentTool, FacilityPlanningTool, PropertySearchTool, Tool,
        ToolError, ToolRegistry, ToolResult, ToolResultEnvelope, ZoningAnalysisTool,
    };
    pub use crate::workflow::{
        ConcurrentWorkflow, ExecutionTrace, FanoutResult, SequentialWorkflow, StepTrace,
    };
}
