use super::{CompletionError, CompletionProvider, Message};
use crate::config::OpenAIConfig;
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde_json::json;

/// Chat completions client for OpenAI-compatible endpoints
pub struct OpenAIProvider {
    config: OpenAIConfig,
    api_key: Option<SecretString>,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig, api_key: Option<SecretString>) -> Self {
        Self {
            config,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("api_key", &self.api_key)
            .finish()
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn check_health(&self) -> bool {
        self.api_key
            .as_ref()
            .map(|k| !k.unsecure().is_empty())
            .unwrap_or(false)
    }

    async fn complete(&self, messages: &[Message]) -> super::Result<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            CompletionError::AuthenticationFailed("OPENAI_API_KEY is not set".to_string())
        })?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let payload = json!({
            "model": self.config.model,
            "messages": messages,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.unsecure()))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    CompletionError::ProviderUnavailable(e.to_string())
                } else {
                    CompletionError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(CompletionError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(CompletionError::RateLimitExceeded);
            } else if status.is_server_error() {
                return Err(CompletionError::ProviderUnavailable(format!(
                    "{}: {}",
                    status, text
                )));
            } else {
                return Err(CompletionError::InvalidRequest(text));
            }
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| CompletionError::ParseError("No choices in response".to_string()))?;

        let message = choice
            .get("message")
            .ok_or_else(|| CompletionError::ParseError("No message in choice".to_string()))?;

        message
            .get("content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| CompletionError::ParseError("Empty content".to_string()))
    }
}
