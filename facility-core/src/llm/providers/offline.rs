//! Deterministic provider that never leaves the process

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::{LLMProvider, LLMRequest, LLMResponse, ModelInfo};

/// Prefix of the line agents use to hand tool output to the model.
pub const OBSERVATIONS_PREFIX: &str = "Tool observations:";

/// Offline LLM provider.
///
/// Replies with the tool observations line of the last user message (or its
/// first line when there is none) followed by the stopping token, so every
/// agent finishes after a single call.
#[derive(Debug, Clone)]
pub struct OfflineProvider {
    stopping_token: String,
}

impl OfflineProvider {
    pub fn new(stopping_token: impl Into<String>) -> Self {
        Self {
            stopping_token: stopping_token.into(),
        }
    }

    fn answer(&self, request: &LLMRequest) -> String {
        let user = request.last_user_message().unwrap_or_default();
        let line = user
            .lines()
            .find(|line| line.starts_with(OBSERVATIONS_PREFIX))
            .or_else(|| user.lines().map(str::trim).find(|line| !line.is_empty()))
            .unwrap_or("No findings.");
        format!("{}\n{}", line.trim(), self.stopping_token)
    }
}

impl Default for OfflineProvider {
    fn default() -> Self {
        Self::new("<DONE>")
    }
}

#[async_trait]
impl LLMProvider for OfflineProvider {
    async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
        Ok(LLMResponse {
            content: self.answer(request),
            usage: None,
        })
    }

    fn model_info(&self) -> ModelInfo {
        ModelInfo {
            provider: "offline".to_string(),
            model_name: "echo-observations".to_string(),
        }
    }
}
