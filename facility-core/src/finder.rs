//! Top-level drivers: the recommendation pipeline and the fan-out
//!
//! A [`FacilityFinder`] owns the stage agents built from configuration. It
//! runs the sequential pipeline to produce a [`Recommendation`], and can
//! run the fixed fan-out tasks for independent per-stage findings.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::FacilityConfig;
use crate::error::Result;
use crate::llm::{LLMProvider, LLMProviderFactory};
use crate::memory::{MemoryBackend, VectorMemory};
use crate::records::SearchCriteria;
use crate::stages::{Stage, StageRoster};
use crate::workflow::{ConcurrentWorkflow, ExecutionTrace, FanoutResult, SequentialWorkflow};

/// Text placed before the pipeline output in every recommendation
pub const RECOMMENDATION_PREFIX: &str = "Recommendation based on analysis: ";

/// Final result of a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// The recommendation as written to the report
    pub text: String,

    /// Raw output of the last stage
    pub pipeline_output: String,

    pub trace: ExecutionTrace,
}

impl Recommendation {
    pub fn new(pipeline_output: impl Into<String>, trace: ExecutionTrace) -> Self {
        let pipeline_output = pipeline_output.into();
        Self {
            text: format!("{}{}", RECOMMENDATION_PREFIX, pipeline_output),
            pipeline_output,
            trace,
        }
    }
}

/// Stage agents plus the settings that drive them
pub struct FacilityFinder {
    config: FacilityConfig,
    roster: StageRoster,
    memory: Option<Arc<VectorMemory>>,
}

impl FacilityFinder {
    /// Validate `config`, create the configured LLM provider and build the agents.
    pub async fn from_config(config: FacilityConfig) -> Result<Self> {
        config.validate()?;
        let provider = LLMProviderFactory::from_config(&config)?;
        Self::with_provider(config, provider).await
    }

    /// Build the agents around an existing provider.
    pub async fn with_provider(
        config: FacilityConfig,
        provider: Arc<dyn LLMProvider>,
    ) -> Result<Self> {
        let memory = if config.memory.enabled {
            Some(Arc::new(VectorMemory::open(&config.memory).await?))
        } else {
            None
        };
        let shared = memory
            .clone()
            .map(|memory| memory as Arc<dyn MemoryBackend>);
        let roster = StageRoster::build(&config, provider, shared)?;

        Ok(Self {
            config,
            roster,
            memory,
        })
    }

    pub fn config(&self) -> &FacilityConfig {
        &self.config
    }

    pub fn roster(&self) -> &StageRoster {
        &self.roster
    }

    pub fn memory(&self) -> Option<&Arc<VectorMemory>> {
        self.memory.as_ref()
    }

    /// Run the stage pipeline for `criteria` and wrap its output.
    pub async fn find_rehab_facility_property(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Recommendation> {
        let workflow = SequentialWorkflow::new(&self.roster)
            .with_max_loops(self.config.workflow.sequential_loops);
        let (output, trace) = workflow.run(criteria).await?;

        tracing::info!(
            stages = trace.completed_steps(),
            chars = output.len(),
            "recommendation ready"
        );
        Ok(Recommendation::new(output, trace))
    }

    /// Run each stage on its fixed fan-out task and log every result.
    pub async fn run_fanout(&self) -> Result<Vec<FanoutResult>> {
        let mut workflow = ConcurrentWorkflow::new(self.config.workflow.max_workers)
            .with_tool_args(self.config.search.to_tool_args());
        for stage in Stage::ORDER {
            if let Some(agent) = self.roster.agent(stage) {
                workflow = workflow.add(stage.fanout_task(), Arc::clone(agent));
            }
        }

        let results = workflow.run().await?;
        for result in &results {
            match (&result.output, &result.error) {
                (Some(output), _) => tracing::info!(
                    agent = %result.agent,
                    task = %result.task,
                    duration_ms = result.duration_ms,
                    output = %output,
                    "fan-out result"
                ),
                (None, error) => tracing::warn!(
                    agent = %result.agent,
                    task = %result.task,
                    error = error.as_deref().unwrap_or("unknown"),
                    "fan-out task failed"
                ),
            }
        }
        Ok(results)
    }
}
