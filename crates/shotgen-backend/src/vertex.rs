//! Vertex AI backend.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shotgen_models::{BackendCallResult, BackendKind, TokenUsage};
use tracing::debug;

use crate::backend::{observe_call, read_response, GenerationBackend};
use crate::config::VertexConfig;
use crate::error::{BackendError, BackendResult};
use crate::token_cache::{AccessTokenSource, TokenCache};
use crate::wire::GenerateContentRequest;

/// Vertex AI client authenticated with short-lived OAuth tokens.
pub struct VertexBackend {
    http: Client,
    config: VertexConfig,
    endpoint: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl VertexBackend {
    /// Create a backend using the configured service account (or ambient credentials).
    pub async fn new(config: VertexConfig) -> BackendResult<Self> {
        let tokens = TokenCache::from_credentials(config.credentials_path.as_deref()).await?;
        Self::with_token_source(config, Arc::new(tokens))
    }

    /// Create a backend with an explicit token source.
    pub fn with_token_source(
        config: VertexConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> BackendResult<Self> {
        if config.project_id.trim().is_empty() {
            return Err(BackendError::configuration("Vertex project id is empty"));
        }

        let http = Client::builder()
            .timeout(config.tuning.timeout)
            .connect_timeout(config.tuning.connect_timeout)
            .pool_max_idle_per_host(10)
            .user_agent(concat!("shotgen-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BackendError::configuration(format!("HTTP client: {}", e)))?;

        let endpoint = config.endpoint();

        Ok(Self {
            http,
            config,
            endpoint,
            tokens,
        })
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    async fn send(&self, request: &GenerateContentRequest) -> BackendResult<reqwest::Response> {
        let token = self.tokens.access_token().await?;
        Ok(self
            .http
            .post(&self.endpoint)
            .bearer_auth(&token)
            .json(request)
            .send()
            .await?)
    }

    async fn generate(&self, prompt: &str) -> BackendResult<(String, Option<TokenUsage>)> {
        let request = GenerateContentRequest::from_prompt(prompt, &self.config.tuning);

        let mut response = self.send(&request).await?;

        // An expired token gets exactly one fresh attempt; other 401s are fatal.
        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            if !Self::is_access_token_expired(&body) {
                return Err(BackendError::from_http_status(401, body));
            }
            debug!("Vertex access token expired, refreshing");
            self.tokens.invalidate().await;
            response = self.send(&request).await?;
        }

        read_response(response).await?.into_text()
    }
}

#[async_trait]
impl GenerationBackend for VertexBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Vertex
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn call(&self, prompt: &str) -> BackendResult<BackendCallResult> {
        observe_call(BackendKind::Vertex, &self.config.model, self.generate(prompt)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_cache::StaticToken;

    #[test]
    fn test_expired_token_detection() {
        assert!(VertexBackend::is_access_token_expired(
            r#"{"error":{"status":"UNAUTHENTICATED"}}"#
        ));
        assert!(!VertexBackend::is_access_token_expired(
            r#"{"error":{"status":"PERMISSION_DENIED"}}"#
        ));
    }

    #[test]
    fn test_empty_project_rejected() {
        let result = VertexBackend::with_token_source(
            VertexConfig::new("", "us-central1"),
            Arc::new(StaticToken::new("t")),
        );
        assert!(matches!(result, Err(BackendError::Configuration(_))));
    }
}
