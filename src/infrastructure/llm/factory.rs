//! Factory wiring configured generation providers

use std::sync::Arc;

use super::http_client::HttpClient;
use super::{DeepseekProvider, OllamaProvider};
use crate::config::{LlmSettings, ProviderKind};
use crate::domain::{DomainError, LlmProvider};

/// Factory for creating generation providers from configuration
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    pub fn create(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>, DomainError> {
        match settings.provider {
            ProviderKind::Deepseek => {
                let api_key = settings.deepseek.api_key.clone().ok_or_else(|| {
                    DomainError::configuration(
                        "DeepSeek provider selected but no API key configured",
                    )
                })?;

                let client = HttpClient::new().with_bearer_token(api_key);
                Ok(Arc::new(DeepseekProvider::with_base_url(
                    client,
                    settings.deepseek.chat_model.clone(),
                    settings.deepseek.base_url.clone(),
                )))
            }
            ProviderKind::Ollama => {
                let client = HttpClient::new();
                Ok(Arc::new(OllamaProvider::with_base_url(
                    client,
                    settings.ollama.chat_model.clone(),
                    settings.ollama.base_url.clone(),
                )))
            }
        }
    }
}
