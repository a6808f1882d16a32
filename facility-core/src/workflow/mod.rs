//! Multi-agent orchestration
//!
//! Two shapes are supported:
//!
//! - [`SequentialWorkflow`]: the stage pipeline. Each stage's output becomes
//!   the next stage's task, and the first failure aborts the run.
//! - [`ConcurrentWorkflow`]: an independent fan-out with a bounded number of
//!   workers. Failures are reported per task.

mod concurrent;
mod execution;
mod sequential;

pub use concurrent::{ConcurrentWorkflow, FanoutResult};
pub use execution::{ExecutionTrace, StepTrace};
pub use sequential::SequentialWorkflow;
