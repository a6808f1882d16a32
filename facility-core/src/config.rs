//! Configuration types for the facility finder
//!
//! Configuration is layered with figment:
//! 1. Built-in defaults
//! 2. `facility.toml` in the working directory
//! 3. The file named by `FACILITY_CONFIG_PATH`
//! 4. `FACILITY_` environment variables, nested keys split by `__`
//!    (for example `FACILITY_LLM__MODEL=gpt-4o`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FacilityError, Result};
use crate::memory::DistanceMetric;
use crate::records::SearchCriteria;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FacilityConfig {
    /// LLM provider configuration
    pub llm: LlmSettings,

    /// Long-term memory configuration
    pub memory: MemorySettings,

    /// Agent behaviour shared by every stage agent
    pub agents: AgentSettings,

    /// Pipeline and fan-out configuration
    pub workflow: WorkflowSettings,

    /// Default search criteria
    pub search: SearchCriteria,

    /// Recommendation report output
    pub report: ReportSettings,

    /// Log output
    pub logging: LoggingSettings,
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// OpenAI chat completions
    #[default]
    OpenAI,
    /// Deterministic local provider, no network
    Offline,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,

    /// Model name
    pub model: String,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,

    /// Maximum tokens per reply
    pub max_tokens: usize,

    /// API key (falls back to `OPENAI_API_KEY`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for compatible endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::OpenAI,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.5,
            max_tokens: 1024,
            api_key: None,
            base_url: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Long-term memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Attach a shared memory to every agent
    pub enabled: bool,

    /// Similarity metric for recall
    pub metric: DistanceMetric,

    /// Maximum memories recalled per query
    pub n_results: usize,

    /// Directory holding the persisted collection
    pub output_dir: Option<PathBuf>,

    /// Folder of documents ingested at start-up
    pub docs_folder: Option<PathBuf>,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            metric: DistanceMetric::Cosine,
            n_results: 3,
            output_dir: Some(PathBuf::from("rehab_facility_data")),
            docs_folder: Some(PathBuf::from("property_docs")),
        }
    }
}

/// Agent behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum LLM calls per agent run
    pub max_loops: usize,

    /// Marker that ends an agent loop early
    pub stopping_token: String,

    /// Write agent state after each run
    pub autosave: bool,

    /// Log agent configuration when agents are built
    pub dashboard: bool,

    /// Directory for autosaved agent state
    pub state_dir: PathBuf,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_loops: 5,
            stopping_token: "<DONE>".to_string(),
            autosave: true,
            dashboard: true,
            state_dir: PathBuf::from("rehab_facility_data/agents"),
        }
    }
}

/// Pipeline and fan-out configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Passes over the whole stage sequence
    pub sequential_loops: usize,

    /// Fan-out worker pool size
    pub max_workers: usize,

    /// Run the fan-out before the pipeline
    pub run_fanout: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            sequential_loops: 1,
            max_workers: 4,
            run_fanout: true,
        }
    }
}

/// Recommendation report output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub output_path: PathBuf,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("rehab_facility_recommendation.txt"),
        }
    }
}

/// Log output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Append-mode log file, none for stderr only
    pub file: Option<PathBuf>,

    /// Filter used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: Some(PathBuf::from("rehab_facility_finder.log")),
            filter: "info".to_string(),
        }
    }
}

impl FacilityConfig {
    /// Load configuration from defaults, files and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is invalid or a value fails validation.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(FacilityConfig::default()))
            .merge(Toml::file("facility.toml"));

        if let Ok(path) = std::env::var("FACILITY_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: FacilityConfig = figment
            .merge(Env::prefixed("FACILITY_").split("__"))
            .extract()
            .map_err(|e| {
                FacilityError::Configuration(format!("Failed to load configuration: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file on top of the defaults.
    ///
    /// `FACILITY_*` environment variables still override the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed, or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let path = path.as_ref();
        if !path.exists() {
            return Err(FacilityError::Configuration(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let config: FacilityConfig = Figment::from(Serialized::defaults(FacilityConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("FACILITY_").split("__"))
            .extract()
            .map_err(|e| {
                FacilityError::Configuration(format!("Failed to load configuration file: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.workflow.max_workers == 0 {
            return Err(FacilityError::Configuration(
                "workflow.max_workers must be greater than zero".to_string(),
            ));
        }
        if self.workflow.sequential_loops == 0 {
            return Err(FacilityError::Configuration(
                "workflow.sequential_loops must be greater than zero".to_string(),
            ));
        }
        if self.agents.max_loops == 0 {
            return Err(FacilityError::Configuration(
                "agents.max_loops must be greater than zero".to_string(),
            ));
        }
        if self.memory.n_results == 0 {
            return Err(FacilityError::Configuration(
                "memory.n_results must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(FacilityError::Configuration(format!(
                "llm.temperature {} outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        Ok(())
    }
}
