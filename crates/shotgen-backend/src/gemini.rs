//! Hosted Gemini API backend.

use async_trait::async_trait;
use reqwest::Client;
use shotgen_models::{BackendCallResult, BackendKind, TokenUsage};

use crate::backend::{observe_call, read_response, GenerationBackend};
use crate::config::GeminiConfig;
use crate::error::{BackendError, BackendResult};
use crate::wire::GenerateContentRequest;

/// Gemini API client authenticated with an API key.
pub struct GeminiBackend {
    http: Client,
    config: GeminiConfig,
    endpoint: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(config: GeminiConfig) -> BackendResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(BackendError::configuration("Gemini API key is empty"));
        }

        let http = Client::builder()
            .timeout(config.tuning.timeout)
            .connect_timeout(config.tuning.connect_timeout)
            .pool_max_idle_per_host(10)
            .user_agent(concat!("shotgen-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::configuration(format!("HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            http,
            config,
            endpoint,
        })
    }

    async fn generate(&self, prompt: &str) -> BackendResult<(String, Option<TokenUsage>)> {
        let request = GenerateContentRequest::from_prompt(prompt, &self.config.tuning);

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        read_response(response).await?.into_text()
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gemini
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn call(&self, prompt: &str) -> BackendResult<BackendCallResult> {
        observe_call(BackendKind::Gemini, &self.config.model, self.generate(prompt)).await
    }
}
