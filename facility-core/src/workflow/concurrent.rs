//! Bounded fan-out of independent agent tasks
//!
//! Every registered `(task, agent)` pair runs in its own tokio task. A
//! semaphore caps how many run at once. A failing or panicking task is
//! reported in its [`FanoutResult`] and never cancels its siblings.
//!
//! Fan-out runs are detached: their outputs are returned to the caller and
//! never written to the agents' shared memory.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::agent::FacilityAgent;
use crate::error::{FacilityError, Result};

/// Outcome of one fan-out task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanoutResult {
    pub agent: String,
    pub task: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration_ms: u64,
}

impl FanoutResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs independent agent tasks with at most `max_workers` in flight
pub struct ConcurrentWorkflow {
    max_workers: usize,
    tasks: Vec<(String, Arc<FacilityAgent>)>,
    tool_args: Value,
}

impl ConcurrentWorkflow {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers,
            tasks: Vec::new(),
            tool_args: Value::Object(Default::default()),
        }
    }

    /// Queue `task` for `agent`
    pub fn add(mut self, task: impl Into<String>, agent: Arc<FacilityAgent>) -> Self {
        self.tasks.push((task.into(), agent));
        self
    }

    /// Arguments handed to every agent's tools
    pub fn with_tool_args(mut self, tool_args: Value) -> Self {
        self.tool_args = tool_args;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Run every queued task and collect the results in submission order.
    pub async fn run(&self) -> Result<Vec<FanoutResult>> {
        if self.max_workers == 0 {
            return Err(FacilityError::Workflow(
                "fan-out needs at least one worker".to_string(),
            ));
        }

        tracing::info!(
            tasks = self.tasks.len(),
            max_workers = self.max_workers,
            "fan-out started"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut handles = Vec::with_capacity(self.tasks.len());

        for (task, agent) in &self.tasks {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| FacilityError::Workflow("worker pool closed".to_string()))?;

            let agent = Arc::clone(agent);
            let agent_name = agent.name().to_string();
            let task_text = task.clone();
            let tool_args = self.tool_args.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let start = Instant::now();
                let result = agent.run_detached(&task_text, &tool_args).await;
                (result, start.elapsed().as_millis() as u64)
            });
            handles.push((agent_name, task.clone(), handle));
        }

        let joined = futures::future::join_all(
            handles
                .into_iter()
                .map(|(agent, task, handle)| async move { (agent, task, handle.await) }),
        )
        .await;

        let results: Vec<FanoutResult> = joined
            .into_iter()
            .map(|(agent, task, joined)| match joined {
                Ok((Ok(output), duration_ms)) => FanoutResult {
                    agent,
                    task,
                    output: Some(output.output),
                    error: None,
                    duration_ms,
                },
                Ok((Err(e), duration_ms)) => FanoutResult {
                    agent,
                    task,
                    output: None,
                    error: Some(e.to_string()),
                    duration_ms,
                },
                Err(e) => FanoutResult {
                    agent,
                    task,
                    output: None,
                    error: Some(format!("Task panicked: {}", e)),
                    duration_ms: 0,
                },
            })
            .collect();

        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::info!(
            completed = results.len() - failed,
            failed,
            "fan-out finished"
        );
        Ok(results)
    }
}
