//! The four assessment stages and the agents that run them

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::FacilityAgent;
use crate::config::FacilityConfig;
use crate::error::Result;
use crate::llm::LLMProvider;
use crate::memory::MemoryBackend;
use crate::prompts;
use crate::tools::{
    BoxedTool, CommunityAssessmentTool, FacilityPlanningTool, PropertySearchTool,
    ZoningAnalysisTool,
};

/// One fixed assessment step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Search,
    Zoning,
    Community,
    Planning,
}

impl Stage {
    /// Pipeline order
    pub const ORDER: [Stage; 4] = [
        Stage::Search,
        Stage::Zoning,
        Stage::Community,
        Stage::Planning,
    ];

    /// Name of the agent persona for this stage
    pub fn agent_name(self) -> &'static str {
        match self {
            Stage::Search => "Property Searcher",
            Stage::Zoning => "Zoning Analyst",
            Stage::Community => "Community Impact Assessor",
            Stage::Planning => "Facility Planner",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Stage::Search => prompts::PROPERTY_SEARCHER,
            Stage::Zoning => prompts::ZONING_ANALYST,
            Stage::Community => prompts::COMMUNITY_IMPACT_ASSESSOR,
            Stage::Planning => prompts::FACILITY_PLANNER,
        }
    }

    /// The data-producing tool backing this stage
    pub fn tool(self) -> BoxedTool {
        match self {
            Stage::Search => Arc::new(PropertySearchTool::new()),
            Stage::Zoning => Arc::new(ZoningAnalysisTool::new()),
            Stage::Community => Arc::new(CommunityAssessmentTool::new()),
            Stage::Planning => Arc::new(FacilityPlanningTool::new()),
        }
    }

    /// Fixed task given to this stage during the fan-out
    pub fn fanout_task(self) -> &'static str {
        match self {
            Stage::Search => "Search for properties in Miami suitable for rehab facilities",
            Stage::Zoning => "Analyze zoning for 123 Palm Ave, Miami, FL",
            Stage::Community => "Assess community impact for 123 Palm Ave, Miami, FL",
            Stage::Planning => "Plan facility layout for 123 Palm Ave, Miami, FL",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

/// One agent per stage, in pipeline order
#[derive(Debug, Clone)]
pub struct StageRoster {
    agents: Vec<(Stage, Arc<FacilityAgent>)>,
}

impl StageRoster {
    /// Build the four stage agents from configuration.
    ///
    /// Every agent shares `provider` and, when given, `memory`.
    pub fn build(
        config: &FacilityConfig,
        provider: Arc<dyn LLMProvider>,
        memory: Option<Arc<dyn MemoryBackend>>,
    ) -> Result<Self> {
        let mut agents = Vec::with_capacity(Stage::ORDER.len());
        for stage in Stage::ORDER {
            let mut builder = FacilityAgent::builder()
                .name(stage.agent_name())
                .system_prompt(stage.system_prompt())
                .llm_provider(Arc::clone(&provider))
                .tool(stage.tool())
                .agent_settings(&config.agents)
                .temperature(config.llm.temperature)
                .max_tokens(config.llm.max_tokens)
                .recall_limit(config.memory.n_results);
            if let Some(memory) = &memory {
                builder = builder.memory(Arc::clone(memory));
            }
            agents.push((stage, Arc::new(builder.build()?)));
        }
        Ok(Self { agents })
    }

    /// Use an explicit list of agents
    pub fn from_agents(agents: Vec<(Stage, Arc<FacilityAgent>)>) -> Self {
        Self { agents }
    }

    pub fn agent(&self, stage: Stage) -> Option<&Arc<FacilityAgent>> {
        self.agents
            .iter()
            .find(|(s, _)| *s == stage)
            .map(|(_, agent)| agent)
    }

    pub fn agents(&self) -> &[(Stage, Arc<FacilityAgent>)] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OfflineProvider;
    use crate::tools::Tool;

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<&str> = Stage::ORDER.iter().map(|s| s.agent_name()).collect();
        assert_eq!(
            names,
            vec![
                "Property Searcher",
                "Zoning Analyst",
                "Community Impact Assessor",
                "Facility Planner"
            ]
        );
        assert_eq!(Stage::Zoning.to_string(), "Zoning Analyst");
    }

    #[test]
    fn test_stage_tools_match() {
        let tools: Vec<String> = Stage::ORDER
            .iter()
            .map(|s| s.tool().name().to_string())
            .collect();
        assert_eq!(
            tools,
            vec![
                PropertySearchTool::NAME,
                ZoningAnalysisTool::NAME,
                CommunityAssessmentTool::NAME,
                FacilityPlanningTool::NAME
            ]
        );
    }

    #[test]
    fn test_fanout_tasks() {
        assert_eq!(
            Stage::Search.fanout_task(),
            "Search for properties in Miami suitable for rehab facilities"
        );
        for stage in [Stage::Zoning, Stage::Community, Stage::Planning] {
            assert!(stage.fanout_task().ends_with("123 Palm Ave, Miami, FL"));
        }
    }

    #[test]
    fn test_roster_build() {
        let mut config = FacilityConfig::default();
        config.agents.autosave = false;
        config.agents.dashboard = false;
        config.agents.max_loops = 2;

        let roster =
            StageRoster::build(&config, Arc::new(OfflineProvider::default()), None).unwrap();

        assert_eq!(roster.len(), 4);
        let planner = roster.agent(Stage::Planning).unwrap();
        assert_eq!(planner.name(), "Facility Planner");
        assert_eq!(planner.max_loops(), 2);
        assert_eq!(planner.tool_names(), vec!["Facility Planning"]);
        assert_eq!(
            roster.agents().iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            Stage::ORDER.to_vec()
        );
    }
}
