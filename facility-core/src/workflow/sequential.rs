//! Sequential pipeline over the four stages
//!
//! Each stage receives the previous stage's text output as its task. Typed
//! data travels separately through the tool arguments: the search criteria
//! from the start, plus the first property found once the search stage ran.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use super::execution::{ExecutionTrace, StepTrace};
use crate::agent::{AgentOutput, FacilityAgent};
use crate::error::{FacilityError, Result};
use crate::records::SearchCriteria;
use crate::stages::{Stage, StageRoster};
use crate::tools::PropertySearchTool;

/// Runs the stage agents one after another
pub struct SequentialWorkflow {
    name: String,
    stages: Vec<(Stage, Arc<FacilityAgent>)>,
    max_loops: usize,
}

impl SequentialWorkflow {
    /// Pipeline over every agent of a roster
    pub fn new(roster: &StageRoster) -> Self {
        Self::from_stages(roster.agents().to_vec())
    }

    /// Pipeline over an explicit set of stage agents, run in [`Stage::ORDER`]
    pub fn from_stages(mut stages: Vec<(Stage, Arc<FacilityAgent>)>) -> Self {
        stages.sort_by_key(|(stage, _)| Stage::ORDER.iter().position(|s| s == stage));
        Self {
            name: "rehab_facility_pipeline".to_string(),
            stages,
            max_loops: 1,
        }
    }

    /// Number of passes over the whole stage sequence
    pub fn with_max_loops(mut self, max_loops: usize) -> Self {
        self.max_loops = max_loops;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Stages in execution order
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.iter().map(|(stage, _)| *stage).collect()
    }

    /// Run the pipeline for `criteria`.
    ///
    /// Returns the last stage's output and the trace of every stage run.
    /// The first failing stage aborts the pipeline.
    pub async fn run(&self, criteria: &SearchCriteria) -> Result<(String, ExecutionTrace)> {
        if self.stages.is_empty() {
            return Err(FacilityError::Workflow("pipeline has no stages".to_string()));
        }
        if self.max_loops == 0 {
            return Err(FacilityError::Workflow(
                "pipeline needs at least one pass".to_string(),
            ));
        }

        let mut trace = ExecutionTrace::new(&self.name);
        let mut task = criteria.instruction();
        let mut tool_args = criteria.to_tool_args();

        tracing::info!(workflow = %self.name, location = %criteria.location, budget = criteria.budget, "pipeline started");

        for pass in 1..=self.max_loops {
            for (stage, agent) in &self.stages {
                let started = Instant::now();
                tracing::info!(stage = %stage, pass, "stage started");

                match agent.run(&task, &tool_args).await {
                    Ok(output) => {
                        let duration_ms = started.elapsed().as_millis() as u64;
                        if *stage == Stage::Search {
                            thread_property(&mut tool_args, &output);
                        }
                        trace.add_step(StepTrace::success(
                            stage.agent_name(),
                            pass,
                            task.as_str(),
                            output.output.as_str(),
                            output.loops,
                            duration_ms,
                        ));
                        tracing::info!(stage = %stage, pass, duration_ms, "stage finished");
                        task = output.output;
                    }
                    Err(e) => {
                        let duration_ms = started.elapsed().as_millis() as u64;
                        trace.add_step(StepTrace::failure(
                            stage.agent_name(),
                            pass,
                            task.as_str(),
                            e.to_string(),
                            duration_ms,
                        ));
                        tracing::error!(stage = %stage, pass, error = %e, "stage failed, aborting pipeline");
                        return Err(e);
                    }
                }
            }
        }

        if task.trim().is_empty() {
            return Err(FacilityError::Workflow(
                "final stage produced an empty result".to_string(),
            ));
        }

        tracing::info!(
            workflow = %self.name,
            steps = trace.steps.len(),
            total_ms = trace.total_duration_ms,
            "pipeline finished"
        );
        Ok((task, trace))
    }
}

/// Put the first property the search returned under `property`.
fn thread_property(tool_args: &mut Value, output: &AgentOutput) {
    let property = output
        .observations
        .iter()
        .filter(|o| o.tool == PropertySearchTool::NAME)
        .filter_map(|o| o.value.as_ref())
        .find_map(|value| value.as_array().and_then(|list| list.first()))
        .cloned();

    match (property, tool_args.as_object_mut()) {
        (Some(property), Some(args)) => {
            args.insert("property".to_string(), property);
        }
        _ => tracing::warn!("search stage returned no property to pass on"),
    }
}
