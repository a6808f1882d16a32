//! Factory for creating LLM providers from configuration

use std::sync::Arc;

use crate::config::{FacilityConfig, LlmProviderKind, LlmSettings};
use crate::error::Result;
use crate::llm::LLMProvider;
use crate::llm::providers::{OfflineProvider, OpenAIProvider};

/// Factory for creating LLM providers
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration
    ///
    /// # Arguments
    ///
    /// * `settings` - LLM provider configuration
    /// * `stopping_token` - Token the offline provider appends to every reply
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be created (e.g., missing API key)
    pub fn create(settings: &LlmSettings, stopping_token: &str) -> Result<Arc<dyn LLMProvider>> {
        match settings.provider {
            LlmProviderKind::OpenAI => {
                let provider = match &settings.api_key {
                    Some(api_key) => match &settings.base_url {
                        Some(base_url) => OpenAIProvider::with_base_url(
                            api_key.clone(),
                            settings.model.clone(),
                            base_url.clone(),
                        ),
                        None => OpenAIProvider::new(api_key.clone(), settings.model.clone()),
                    },
                    None => OpenAIProvider::from_env(Some(settings.model.clone()))?,
                };
                let provider = provider.with_timeout(settings.request_timeout)?;

                tracing::info!(model = %settings.model, base_url = provider.base_url(), "using OpenAI provider");
                Ok(Arc::new(provider))
            }
            LlmProviderKind::Offline => {
                tracing::info!("using offline provider");
                Ok(Arc::new(OfflineProvider::new(stopping_token)))
            }
        }
    }

    /// Create the provider described by a full configuration
    pub fn from_config(config: &FacilityConfig) -> Result<Arc<dyn LLMProvider>> {
        Self::create(&config.llm, &config.agents.stopping_token)
    }
}
