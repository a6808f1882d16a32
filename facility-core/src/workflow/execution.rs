//! Execution traces recorded by the workflows

use serde::{Deserialize, Serialize};

/// Trace of a single stage execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepTrace {
    /// Stage (agent) name
    pub step_name: String,

    /// Pass over the stage sequence, starting at 1
    pub pass: usize,

    /// Task text handed to the stage
    pub input: String,

    /// Stage output text
    pub output: String,

    /// LLM calls the agent made
    pub loops: usize,

    /// Duration of step execution
    pub duration_ms: u64,

    /// Whether the step succeeded
    pub success: bool,

    /// Error message if failed
    pub error: Option<String>,
}

impl StepTrace {
    /// Create a successful step trace
    pub fn success(
        step_name: impl Into<String>,
        pass: usize,
        input: impl Into<String>,
        output: impl Into<String>,
        loops: usize,
        duration_ms: u64,
    ) -> Self {
        Self {
            step_name: step_name.into(),
            pass,
            input: input.into(),
            output: output.into(),
            loops,
            duration_ms,
            success: true,
            error: None,
        }
    }

    /// Create a failed step trace
    pub fn failure(
        step_name: impl Into<String>,
        pass: usize,
        input: impl Into<String>,
        error: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            step_name: step_name.into(),
            pass,
            input: input.into(),
            output: String::new(),
            loops: 0,
            duration_ms,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Complete execution trace for a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTrace {
    /// Workflow name
    pub workflow_name: String,

    /// Step traces in execution order
    pub steps: Vec<StepTrace>,

    /// Total duration
    pub total_duration_ms: u64,

    /// Whether the workflow completed successfully
    pub success: bool,

    /// Final error if failed
    pub error: Option<String>,
}

impl ExecutionTrace {
    /// Create a new execution trace
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            steps: Vec::new(),
            total_duration_ms: 0,
            success: true,
            error: None,
        }
    }

    /// Add a step trace
    pub fn add_step(&mut self, step: StepTrace) {
        self.total_duration_ms += step.duration_ms;
        if !step.success {
            self.success = false;
            self.error = step.error.clone();
        }
        self.steps.push(step);
    }

    /// Names of the executed steps, in order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step_name.as_str()).collect()
    }

    /// Get the number of completed steps
    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|s| s.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_trace_success() {
        let trace = StepTrace::success("Zoning Analyst", 1, "task", "zoned", 1, 100);

        assert!(trace.success);
        assert!(trace.error.is_none());
        assert_eq!(trace.step_name, "Zoning Analyst");
    }

    #[test]
    fn test_step_trace_failure() {
        let trace = StepTrace::failure("Zoning Analyst", 1, "task", "Something went wrong", 50);

        assert!(!trace.success);
        assert!(trace.output.is_empty());
        assert!(trace.error.is_some());
    }

    #[test]
    fn test_execution_trace() {
        let mut trace = ExecutionTrace::new("pipeline");

        trace.add_step(StepTrace::success("Property Searcher", 1, "a", "b", 1, 100));
        trace.add_step(StepTrace::success("Zoning Analyst", 1, "b", "c", 2, 150));

        assert!(trace.success);
        assert_eq!(trace.completed_steps(), 2);
        assert_eq!(trace.total_duration_ms, 250);
        assert_eq!(trace.step_names(), vec!["Property Searcher", "Zoning Analyst"]);
    }

    #[test]
    fn test_execution_trace_failure() {
        let mut trace = ExecutionTrace::new("pipeline");

        trace.add_step(StepTrace::success("Property Searcher", 1, "a", "b", 1, 100));
        trace.add_step(StepTrace::failure("Zoning Analyst", 1, "b", "Error occurred", 50));

        assert!(!trace.success);
        assert_eq!(trace.completed_steps(), 1);
        assert_eq!(trace.error.as_deref(), Some("Error occurred"));
    }
}
