//! Backend capability trait and shared call plumbing.

use std::future::Future;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use shotgen_models::{BackendCallResult, BackendKind, TokenUsage};
use tracing::{debug, info_span, Instrument};

use crate::error::{BackendError, BackendResult};
use crate::metrics::record_request;
use crate::wire::GenerateContentResponse;

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// A generative-AI backend that turns a prompt into raw model text.
///
/// Implementations hold one long-lived HTTP client and fixed generation
/// parameters; `call` performs exactly one outbound request.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Backend identity reported in results.
    fn kind(&self) -> BackendKind;

    /// Model identifier used for every call.
    fn model(&self) -> &str;

    /// Send one prompt and return the raw model output.
    async fn call(&self, prompt: &str) -> BackendResult<BackendCallResult>;
}

/// Run one backend request inside a tracing span, recording latency and status.
pub(crate) async fn observe_call<F>(
    kind: BackendKind,
    model: &str,
    fut: F,
) -> BackendResult<BackendCallResult>
where
    F: Future<Output = BackendResult<(String, Option<TokenUsage>)>>,
{
    let span = info_span!("backend_call", backend = %kind, model = %model);

    let start = Instant::now();
    let result = fut.instrument(span).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let status = match &result {
        Ok(_) => "200".to_string(),
        Err(e) => e
            .http_status()
            .map(|s| s.to_string())
            .unwrap_or_else(|| e.kind().as_str().to_string()),
    };
    record_request(kind, &status, latency_ms);

    let (text, usage) = result?;
    debug!(backend = %kind, latency_ms, chars = text.len(), "Backend call completed");

    Ok(BackendCallResult {
        text,
        backend: kind,
        model: model.to_string(),
        latency_ms,
        usage,
    })
}

/// Turn an HTTP response into a decoded `generateContent` payload.
pub(crate) async fn read_response(
    response: reqwest::Response,
) -> BackendResult<GenerateContentResponse> {
    let status = response.status();

    if !status.is_success() {
        let retry_after_ms = retry_after_ms(response.headers());
        let body = response.text().await.unwrap_or_default();
        return Err(
            BackendError::from_http_status(status.as_u16(), truncate(&body))
                .with_retry_after(retry_after_ms),
        );
    }

    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// `Retry-After` in delta-seconds form, converted to milliseconds.
pub(crate) fn retry_after_ms(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| secs.saturating_mul(1000))
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
