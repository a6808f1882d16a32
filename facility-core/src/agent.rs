//! LLM-backed stage agent
//!
//! A [`FacilityAgent`] wraps one persona prompt, an LLM provider, the stage's
//! tools and an optional shared memory. A run gathers tool observations,
//! recalls related memories, then loops on the model until it emits the
//! stopping token or runs out of loops.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use facility_core::agent::FacilityAgent;
//! use facility_core::llm::OfflineProvider;
//! use facility_core::tools::ZoningAnalysisTool;
//!
//! # async fn demo() -> facility_core::Result<()> {
//! let agent = FacilityAgent::builder()
//!     .name("Zoning Analyst")
//!     .system_prompt("You are a zoning expert.")
//!     .llm_provider(Arc::new(OfflineProvider::default()))
//!     .tool(Arc::new(ZoningAnalysisTool::new()))
//!     .autosave(false)
//!     .build()?;
//!
//! let output = agent
//!     .run("Analyze zoning for 123 Palm Ave, Miami, FL", &serde_json::json!({}))
//!     .await?;
//! println!("{}", output.output);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::AgentSettings;
use crate::error::{FacilityError, Result};
use crate::llm::providers::offline::OBSERVATIONS_PREFIX;
use crate::llm::{LLMConfig, LLMProvider, LLMRequest, Message};
use crate::memory::{MemoryBackend, MemoryRecord, QueryOptions, StoreOptions};
use crate::prompts;
use crate::tools::{BoxedTool, ToolExecutionContext, ToolResult};

/// What one tool reported during an agent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolObservation {
    pub tool: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolObservation {
    fn success(tool: impl Into<String>, value: Value) -> Self {
        Self {
            tool: tool.into(),
            value: Some(value),
            error: None,
        }
    }

    fn failure(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            value: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of a single agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Agent that produced the output
    pub agent: String,

    /// Unique id of this run, also used as the tool trace id
    pub run_id: String,

    /// The task the agent was given
    pub task: String,

    /// Final reply with the stopping token removed
    pub output: String,

    /// Number of LLM calls made
    pub loops: usize,

    /// Whether the model emitted the stopping token
    pub stopped_early: bool,

    pub observations: Vec<ToolObservation>,
}

/// Snapshot written after each run when autosave is on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_name: String,
    pub run_id: String,
    pub task: String,
    pub loops_used: usize,
    pub observations: Vec<ToolObservation>,
    pub output: String,
    pub saved_at: DateTime<Utc>,
}

/// LLM-backed agent for one assessment stage
pub struct FacilityAgent {
    name: String,
    system_prompt: String,
    llm: Arc<dyn LLMProvider>,
    tools: Vec<BoxedTool>,
    memory: Option<Arc<dyn MemoryBackend>>,
    max_loops: usize,
    stopping_token: String,
    autosave: bool,
    state_dir: PathBuf,
    llm_config: LLMConfig,
    recall_limit: usize,
}

impl std::fmt::Debug for FacilityAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilityAgent")
            .field("name", &self.name)
            .field("tools", &self.tool_names())
            .field("max_loops", &self.max_loops)
            .field("memory", &self.memory.is_some())
            .finish()
    }
}

impl FacilityAgent {
    /// Create a new agent builder
    pub fn builder() -> FacilityAgentBuilder {
        FacilityAgentBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn max_loops(&self) -> usize {
        self.max_loops
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Path of the autosave file for this agent
    pub fn state_path(&self) -> PathBuf {
        self.state_dir.join(format!("{}_state.json", slug(&self.name)))
    }

    /// Run the agent on `task`, passing `tool_args` to every tool.
    ///
    /// The output is stored in the agent's memory, where later runs recall it.
    pub async fn run(&self, task: &str, tool_args: &Value) -> Result<AgentOutput> {
        self.run_with(task, tool_args, true).await
    }

    /// Run like [`FacilityAgent::run`] without storing the output in memory.
    ///
    /// Recall still happens, so a detached run can use earlier findings while
    /// leaving nothing behind for other runs to pick up.
    pub async fn run_detached(&self, task: &str, tool_args: &Value) -> Result<AgentOutput> {
        self.run_with(task, tool_args, false).await
    }

    async fn run_with(&self, task: &str, tool_args: &Value, remember: bool) -> Result<AgentOutput> {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("agent_run", agent = %self.name, run_id = %run_id, remember);
        self.run_inner(task, tool_args, run_id, remember)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        task: &str,
        tool_args: &Value,
        run_id: String,
        remember: bool,
    ) -> Result<AgentOutput> {
        let started = std::time::Instant::now();

        let observations = self.observe(tool_args, &run_id).await;
        let memories = self.recall(task).await?;

        let mut messages = vec![
            Message::system(format!(
                "{}\n\n{}",
                self.system_prompt,
                prompts::stopping_instruction(&self.stopping_token)
            )),
            Message::user(render_user_message(task, &observations, &memories)?),
        ];

        let mut reply = String::new();
        let mut loops = 0;
        let mut stopped_early = false;
        while loops < self.max_loops {
            loops += 1;
            let request = LLMRequest::new(messages.clone()).with_config(&self.llm_config);
            let response = self.llm.generate_request(&request).await?;
            reply = response.content;
            messages.push(Message::assistant(reply.clone()));

            if reply.contains(&self.stopping_token) {
                stopped_early = true;
                break;
            }
            if loops < self.max_loops {
                messages.push(Message::user(prompts::CONTINUE_PROMPT));
            }
        }

        let output = reply.replace(&self.stopping_token, "").trim().to_string();
        tracing::info!(
            loops,
            stopped_early,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "agent finished"
        );

        let result = AgentOutput {
            agent: self.name.clone(),
            run_id,
            task: task.to_string(),
            output,
            loops,
            stopped_early,
            observations,
        };

        if remember {
            self.remember(&result).await?;
        }
        if self.autosave {
            self.save_state(&result).await?;
        }
        Ok(result)
    }

    async fn observe(&self, tool_args: &Value, run_id: &str) -> Vec<ToolObservation> {
        let ctx = ToolExecutionContext::new()
            .with_agent_id(&self.name)
            .with_trace_id(run_id);

        let mut observations = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            let observation = match tool.execute(tool_args.clone(), &ctx).await {
                Ok(envelope) => match envelope.result {
                    ToolResult::Success { value } => ToolObservation::success(tool.name(), value),
                    ToolResult::Error { error } => {
                        tracing::warn!(tool = tool.name(), %error, "tool reported an error");
                        ToolObservation::failure(tool.name(), error.to_string())
                    }
                },
                Err(error) => {
                    tracing::warn!(tool = tool.name(), %error, "tool failed");
                    ToolObservation::failure(tool.name(), error.to_string())
                }
            };
            observations.push(observation);
        }
        observations
    }

    async fn recall(&self, task: &str) -> Result<Vec<MemoryRecord>> {
        match &self.memory {
            Some(memory) => {
                let records = memory
                    .search(task, Some(QueryOptions::with_limit(self.recall_limit)))
                    .await?;
                tracing::debug!(recalled = records.len(), "recalled memories");
                Ok(records)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn remember(&self, output: &AgentOutput) -> Result<()> {
        let Some(memory) = &self.memory else {
            return Ok(());
        };
        if output.output.is_empty() {
            return Ok(());
        }

        let options = StoreOptions::new()
            .with_memory_type("agent_output")
            .with_tag(&self.name)
            .with_property("run_id", output.run_id.clone());
        memory.store(output.output.clone(), Some(options)).await?;
        Ok(())
    }

    async fn save_state(&self, output: &AgentOutput) -> Result<()> {
        let state = AgentState {
            agent_name: self.name.clone(),
            run_id: output.run_id.clone(),
            task: output.task.clone(),
            loops_used: output.loops,
            observations: output.observations.clone(),
            output: output.output.clone(),
            saved_at: Utc::now(),
        };

        let path = self.state_path();
        write_json(&path, &state).await?;
        tracing::debug!(path = %path.display(), "saved agent state");
        Ok(())
    }
}

async fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    crate::persist::write_atomic(path, &json).await?;
    Ok(())
}

fn render_user_message(
    task: &str,
    observations: &[ToolObservation],
    memories: &[MemoryRecord],
) -> Result<String> {
    let mut message = format!(
        "{} {}\nTask: {}",
        OBSERVATIONS_PREFIX,
        serde_json::to_string(observations)?,
        task
    );
    if !memories.is_empty() {
        message.push_str("\nRelevant memories:");
        for memory in memories {
            message.push_str("\n- ");
            message.push_str(&memory.content.replace('\n', " "));
        }
    }
    Ok(message)
}

/// Lower-case `name` and join its alphanumeric runs with underscores.
fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Builder for creating agents
pub struct FacilityAgentBuilder {
    name: Option<String>,
    system_prompt: String,
    llm: Option<Arc<dyn LLMProvider>>,
    tools: Vec<BoxedTool>,
    memory: Option<Arc<dyn MemoryBackend>>,
    settings: AgentSettings,
    llm_config: LLMConfig,
    recall_limit: usize,
}

impl FacilityAgentBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            name: None,
            system_prompt: String::new(),
            llm: None,
            tools: Vec::new(),
            memory: None,
            settings: AgentSettings::default(),
            llm_config: LLMConfig::default(),
            recall_limit: 3,
        }
    }

    /// Set agent name (required)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set LLM provider (required)
    pub fn llm_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(provider);
        self
    }

    /// Add a tool
    pub fn tool(mut self, tool: BoxedTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add multiple tools
    pub fn tools(mut self, tools: Vec<BoxedTool>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Attach a long-term memory
    pub fn memory(mut self, memory: Arc<dyn MemoryBackend>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Apply loop, autosave and dashboard settings in one go
    pub fn agent_settings(mut self, settings: &AgentSettings) -> Self {
        self.settings = settings.clone();
        self
    }

    pub fn max_loops(mut self, max_loops: usize) -> Self {
        self.settings.max_loops = max_loops;
        self
    }

    pub fn stopping_token(mut self, token: impl Into<String>) -> Self {
        self.settings.stopping_token = token.into();
        self
    }

    pub fn autosave(mut self, autosave: bool) -> Self {
        self.settings.autosave = autosave;
        self
    }

    pub fn dashboard(mut self, dashboard: bool) -> Self {
        self.settings.dashboard = dashboard;
        self
    }

    pub fn state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.state_dir = dir.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.llm_config = self.llm_config.with_temperature(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.llm_config = self.llm_config.with_max_tokens(max_tokens);
        self
    }

    /// Maximum memories recalled per run
    pub fn recall_limit(mut self, limit: usize) -> Self {
        self.recall_limit = limit;
        self
    }

    /// Build the agent
    pub fn build(self) -> Result<FacilityAgent> {
        let name = self
            .name
            .ok_or_else(|| FacilityError::Configuration("Agent name is required".to_string()))?;
        let llm = self.llm.ok_or_else(|| {
            FacilityError::Configuration(format!("Agent '{}' has no LLM provider", name))
        })?;
        if self.settings.max_loops == 0 {
            return Err(FacilityError::Configuration(format!(
                "Agent '{}' needs max_loops greater than zero",
                name
            )));
        }
        if self.settings.stopping_token.is_empty() {
            return Err(FacilityError::Configuration(format!(
                "Agent '{}' needs a non-empty stopping token",
                name
            )));
        }

        let agent = FacilityAgent {
            name,
            system_prompt: self.system_prompt,
            llm,
            tools: self.tools,
            memory: self.memory,
            max_loops: self.settings.max_loops,
            stopping_token: self.settings.stopping_token,
            autosave: self.settings.autosave,
            state_dir: self.settings.state_dir,
            llm_config: self.llm_config,
            recall_limit: self.recall_limit,
        };

        if self.settings.dashboard {
            let model = agent.llm.model_info();
            tracing::info!(
                agent = %agent.name,
                provider = %model.provider,
                model = %model.model_name,
                tools = ?agent.tool_names(),
                max_loops = agent.max_loops,
                autosave = agent.autosave,
                memory = agent.memory.is_some(),
                "agent ready"
            );
        }

        Ok(agent)
    }
}

impl Default for FacilityAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMResponse, MessageRole};
    use crate::memory::{DistanceMetric, VectorMemory};
    use crate::tools::{
        Tool, ToolError, ToolMetadata, ToolResultEnvelope, ToolSchema, ZoningAnalysisTool,
    };
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replies from a script, recording every request.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<LLMRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "still thinking".to_string());
            Ok(LLMResponse {
                content,
                usage: None,
            })
        }
    }

    struct BrokenTool {
        metadata: ToolMetadata,
    }

    #[async_trait]
    impl Tool for BrokenTool {
        fn metadata(&self) -> &ToolMetadata {
            &self.metadata
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new(serde_json::json!({}))
        }

        async fn execute(
            &self,
            _args: Value,
            _ctx: &ToolExecutionContext,
        ) -> std::result::Result<ToolResultEnvelope, ToolError> {
            Err(ToolError::internal("listing service unavailable"))
        }
    }

    fn agent_with(provider: Arc<ScriptedProvider>) -> FacilityAgentBuilder {
        FacilityAgent::builder()
            .name("Zoning Analyst")
            .system_prompt("You analyze zoning.")
            .llm_provider(provider)
            .autosave(false)
            .dashboard(false)
    }

    #[tokio::test]
    async fn test_stops_at_stopping_token() {
        let provider = ScriptedProvider::new(&["Zoned residential, permit needed <DONE>"]);
        let agent = agent_with(provider.clone()).max_loops(5).build().unwrap();

        let output = agent.run("Analyze zoning", &Value::Null).await.unwrap();

        assert_eq!(output.loops, 1);
        assert!(output.stopped_early);
        assert_eq!(output.output, "Zoned residential, permit needed");
        assert_eq!(provider.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_runs_until_max_loops() {
        let provider = ScriptedProvider::new(&["draft one", "draft two", "draft three"]);
        let agent = agent_with(provider.clone()).max_loops(3).build().unwrap();

        let output = agent.run("Analyze zoning", &Value::Null).await.unwrap();

        assert_eq!(output.loops, 3);
        assert!(!output.stopped_early);
        assert_eq!(output.output, "draft three");

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        // system, user, then assistant + continuation per earlier loop
        assert_eq!(requests[2].messages.len(), 6);
        assert_eq!(requests[2].messages[3].content, prompts::CONTINUE_PROMPT);
        assert_eq!(requests[2].messages[4].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_tool_failures_become_observations() {
        let provider = ScriptedProvider::new(&["done <DONE>"]);
        let agent = agent_with(provider.clone())
            .tool(Arc::new(BrokenTool {
                metadata: ToolMetadata::new("Listings", "Always fails"),
            }))
            .tool(Arc::new(ZoningAnalysisTool::new()))
            .build()
            .unwrap();

        let output = agent.run("Analyze zoning", &serde_json::json!({})).await.unwrap();

        assert_eq!(output.observations.len(), 2);
        assert!(output.observations[0].is_error());
        assert_eq!(output.observations[1].tool, "Zoning Analysis");
        assert_eq!(output.observations[1].value.as_ref().unwrap()["max_occupancy"], 20);

        let requests = provider.requests.lock().unwrap();
        let user = requests[0].last_user_message().unwrap();
        let first_line = user.lines().next().unwrap();
        assert!(first_line.starts_with("Tool observations: ["));
        assert!(first_line.contains("listing service unavailable"));
        assert!(user.contains("Task: Analyze zoning"));
    }

    #[tokio::test]
    async fn test_memory_is_stored_and_recalled() {
        let memory = Arc::new(VectorMemory::new(DistanceMetric::Cosine, 3));
        let provider = ScriptedProvider::new(&[
            "Palm Ave needs a group home permit <DONE>",
            "Confirmed <DONE>",
        ]);
        let agent = agent_with(provider.clone())
            .memory(memory.clone())
            .build()
            .unwrap();

        agent.run("Palm Ave group home permit", &Value::Null).await.unwrap();
        assert_eq!(memory.count().await.unwrap(), 1);

        agent.run("Palm Ave permit status", &Value::Null).await.unwrap();
        let requests = provider.requests.lock().unwrap();
        let second = requests[1].last_user_message().unwrap();
        assert!(second.contains("Relevant memories:"));
        assert!(second.contains("- Palm Ave needs a group home permit"));
    }

    #[tokio::test]
    async fn test_detached_run_recalls_but_stores_nothing() {
        let memory = Arc::new(VectorMemory::new(DistanceMetric::Cosine, 3));
        memory
            .store("Palm Ave sits in an RS-2 district".to_string(), None)
            .await
            .unwrap();
        let provider = ScriptedProvider::new(&["Palm Ave is RS-2 <DONE>"]);
        let agent = agent_with(provider.clone())
            .memory(memory.clone())
            .build()
            .unwrap();

        let output = agent
            .run_detached("Palm Ave district", &Value::Null)
            .await
            .unwrap();

        assert_eq!(output.output, "Palm Ave is RS-2");
        assert_eq!(memory.count().await.unwrap(), 1);
        let requests = provider.requests.lock().unwrap();
        assert!(requests[0]
            .last_user_message()
            .unwrap()
            .contains("- Palm Ave sits in an RS-2 district"));
    }

    #[tokio::test]
    async fn test_autosave_writes_state() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(&["all clear <DONE>"]);
        let agent = agent_with(provider)
            .autosave(true)
            .state_dir(dir.path().join("agents"))
            .build()
            .unwrap();

        let output = agent.run("Analyze zoning", &Value::Null).await.unwrap();

        let path = dir.path().join("agents").join("zoning_analyst_state.json");
        assert_eq!(agent.state_path(), path);
        let state: AgentState =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(state.agent_name, "Zoning Analyst");
        assert_eq!(state.run_id, output.run_id);
        assert_eq!(state.output, "all clear");
        assert_eq!(state.loops_used, 1);
    }

    #[test]
    fn test_builder_requires_name_and_provider() {
        assert!(FacilityAgent::builder().build().is_err());
        assert!(FacilityAgent::builder().name("x").build().is_err());

        let provider = ScriptedProvider::new(&[]);
        assert!(agent_with(provider.clone()).max_loops(0).build().is_err());
        assert!(agent_with(provider).stopping_token("").build().is_err());
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Community Impact Assessor"), "community_impact_assessor");
        assert_eq!(slug("  Zoning/Analyst  "), "zoning_analyst");
    }
}
